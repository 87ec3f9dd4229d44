//! Neutron v2.0 network client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ClientError, RestClient};

const API_VERSION_SUFFIX: &str = "/v2.0";

/// A network, as returned by `GET /networks`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subnets: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fixed IP binding of a port
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// Secondary address a port may carry traffic for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedAddressPair {
    pub ip_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
}

/// A port. Attributes not modelled here are kept in `extra` so the port can
/// be echoed back unchanged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default = "default_admin_state_up")]
    pub admin_state_up: bool,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
    #[serde(default)]
    pub allowed_address_pairs: Vec<AllowedAddressPair>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_admin_state_up() -> bool {
    true
}

/// Body of a port create request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewPort {
    pub name: String,
    pub tenant_id: String,
    pub network_id: String,
    pub admin_state_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_ips: Option<Vec<FixedIp>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_address_pairs: Option<Vec<AllowedAddressPair>>,
}

#[derive(Serialize)]
struct NewPortRoot<'a> {
    port: &'a NewPort,
}

#[derive(Deserialize)]
struct PortRoot {
    port: Port,
}

#[derive(Deserialize)]
struct PortList {
    ports: Vec<Port>,
}

#[derive(Deserialize)]
struct NetworkList {
    networks: Vec<Network>,
}

/// Networking operations used by the port module
#[async_trait]
pub trait NetworkService: Send + Sync {
    /// Networks whose name matches exactly
    async fn list_networks(&self, name: &str) -> Result<Vec<Network>, ClientError>;

    /// Ports owned by `tenant_id` with the given name
    async fn list_ports(&self, tenant_id: &str, name: &str) -> Result<Vec<Port>, ClientError>;

    async fn create_port(&self, port: &NewPort) -> Result<Port, ClientError>;

    async fn delete_port(&self, port_id: &str) -> Result<(), ClientError>;
}

/// Neutron client authenticated with a Keystone token
pub struct NeutronClient {
    rest: RestClient,
}

impl NeutronClient {
    /// `endpoint` is the catalog URL of the network service; the v2.0 API
    /// prefix is appended unless already present.
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, ClientError> {
        let endpoint = endpoint.trim_end_matches('/');
        let base = if endpoint.ends_with(API_VERSION_SUFFIX) {
            endpoint.to_string()
        } else {
            format!("{}{}", endpoint, API_VERSION_SUFFIX)
        };

        Ok(Self {
            rest: RestClient::new(&base, Some(token), timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.rest.base_url()
    }
}

#[async_trait]
impl NetworkService for NeutronClient {
    async fn list_networks(&self, name: &str) -> Result<Vec<Network>, ClientError> {
        let list: NetworkList = self.rest.get("/networks", &[("name", name)]).await?;
        Ok(list.networks)
    }

    async fn list_ports(&self, tenant_id: &str, name: &str) -> Result<Vec<Port>, ClientError> {
        let list: PortList = self
            .rest
            .get("/ports", &[("tenant_id", tenant_id), ("name", name)])
            .await?;
        Ok(list.ports)
    }

    async fn create_port(&self, port: &NewPort) -> Result<Port, ClientError> {
        let root: PortRoot = self.rest.post("/ports", &NewPortRoot { port }).await?;
        Ok(root.port)
    }

    async fn delete_port(&self, port_id: &str) -> Result<(), ClientError> {
        self.rest.delete(&format!("/ports/{}", port_id)).await
    }
}
