//! Keystone v2.0 identity client
//!
//! Password authentication against `{auth_url}/tokens`, the service catalog
//! that comes back with the token, and tenant listing.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ClientError, RestClient};

/// Login credentials for the identity service
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub auth_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .field("tenant_name", &self.tenant_name)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

/// Endpoint interface in the v2.0 catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interface {
    Public,
    Internal,
    Admin,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "publicURL",
            Self::Internal => "internalURL",
            Self::Admin => "adminURL",
        }
    }
}

/// A service in the catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogService {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// One regional endpoint of a catalog service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, rename = "publicURL")]
    pub public_url: Option<String>,
    #[serde(default, rename = "internalURL")]
    pub internal_url: Option<String>,
    #[serde(default, rename = "adminURL")]
    pub admin_url: Option<String>,
}

impl CatalogEndpoint {
    pub fn url(&self, interface: Interface) -> Option<&str> {
        match interface {
            Interface::Public => self.public_url.as_deref(),
            Interface::Internal => self.internal_url.as_deref(),
            Interface::Admin => self.admin_url.as_deref(),
        }
    }
}

/// Authenticated identity session
#[derive(Clone)]
pub struct Session {
    token: String,
    catalog: Vec<CatalogService>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"****")
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl Session {
    pub fn new(token: impl Into<String>, catalog: Vec<CatalogService>) -> Self {
        Self {
            token: token.into(),
            catalog,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// First endpoint URL of the first service of `service_type`, optionally
    /// restricted to one region.
    pub fn url_for(
        &self,
        service_type: &str,
        interface: Interface,
        region: Option<&str>,
    ) -> Option<&str> {
        self.catalog
            .iter()
            .filter(|s| s.service_type == service_type)
            .flat_map(|s| s.endpoints.iter())
            .filter(|e| region.map_or(true, |r| e.region.as_deref() == Some(r)))
            .find_map(|e| e.url(interface))
    }
}

/// A tenant (project) known to the identity service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// Identity operations needed after authentication
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// List all tenants visible to the session
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ClientError>;
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
struct AuthBody<'a> {
    #[serde(rename = "passwordCredentials")]
    password_credentials: PasswordCredentials<'a>,
    #[serde(rename = "tenantName")]
    tenant_name: &'a str,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AccessRoot {
    access: Access,
}

#[derive(Deserialize)]
struct Access {
    token: Token,
    #[serde(default, rename = "serviceCatalog")]
    service_catalog: Vec<CatalogService>,
}

#[derive(Deserialize)]
struct Token {
    id: String,
}

#[derive(Deserialize)]
struct TenantList {
    tenants: Vec<Tenant>,
}

/// Keystone v2.0 client holding an authenticated session
pub struct KeystoneClient {
    session: Session,
    admin: RestClient,
}

impl KeystoneClient {
    /// Authenticate with password credentials and scope to the login tenant.
    ///
    /// Tenant calls go to the catalog's identity admin endpoint, falling back
    /// to the auth URL when the catalog has none.
    pub async fn authenticate(
        credentials: &Credentials,
        region: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let anonymous = RestClient::new(&credentials.auth_url, None, timeout)?;

        let request = AuthRequest {
            auth: AuthBody {
                password_credentials: PasswordCredentials {
                    username: &credentials.username,
                    password: &credentials.password,
                },
                tenant_name: &credentials.tenant_name,
            },
        };

        tracing::debug!(url = %anonymous.base_url(), user = %credentials.username, "requesting token");
        let root: AccessRoot = anonymous.post("/tokens", &request).await?;
        let session = Session::new(root.access.token.id, root.access.service_catalog);

        let identity_url = session
            .url_for("identity", Interface::Admin, region)
            .unwrap_or(&credentials.auth_url)
            .to_string();
        let admin = RestClient::new(&identity_url, Some(session.token()), timeout)?;

        Ok(Self { session, admin })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[async_trait]
impl IdentityService for KeystoneClient {
    async fn list_tenants(&self) -> Result<Vec<Tenant>, ClientError> {
        let list: TenantList = self.admin.get("/tenants", &[]).await?;
        Ok(list.tenants)
    }
}
