//! Port reconciliation
//!
//! Resolves the tenant and network named in the parameters, then drives the
//! port towards the desired state:
//!
//! - `present`: create the port unless one with the same `(tenant, name)`
//!   already exists. Existing ports are never updated.
//! - `absent`: delete the port with that `(tenant, name)` if there is one.
//!
//! Any failed call aborts the run; nothing done before it is rolled back.

use std::time::Duration;

use serde::Serialize;

use crate::client::identity::{Credentials, IdentityService, Interface, KeystoneClient};
use crate::client::network::{AllowedAddressPair, FixedIp, NetworkService, NeutronClient, NewPort, Port};
use crate::error::{PortError, Result};
use crate::params::{ModuleParams, State};

const NETWORK_SERVICE_TYPE: &str = "network";

/// Ids resolved for one invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub tenant_id: String,
    pub network_id: String,
    pub subnet_id: String,
}

/// What the run did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Action {
    Created,
    Deleted,
    Success,
}

/// Result payload of a successful run
#[derive(Clone, Debug, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub result: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
}

impl Outcome {
    fn unchanged(port: Option<Port>) -> Self {
        Self {
            changed: false,
            result: Action::Success,
            port,
        }
    }
}

/// Look up a tenant id by name; the first match in list order wins.
pub async fn resolve_tenant(identity: &dyn IdentityService, tenant_name: &str) -> Result<String> {
    let tenants = identity
        .list_tenants()
        .await
        .map_err(PortError::ListTenants)?;

    tenants
        .into_iter()
        .find(|t| t.name == tenant_name)
        .map(|t| t.id)
        .ok_or_else(|| PortError::TenantNotFound(tenant_name.to_string()))
}

/// Look up a network by name and return its id with the id of its first
/// subnet. Extra matches are ignored.
pub async fn resolve_network(
    network: &dyn NetworkService,
    network_name: &str,
) -> Result<(String, String)> {
    let networks = network
        .list_networks(network_name)
        .await
        .map_err(PortError::ListNetworks)?;

    let first = networks
        .into_iter()
        .next()
        .ok_or_else(|| PortError::NetworkNotFound(network_name.to_string()))?;

    let network_id = first
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| PortError::NetworkIdMissing(network_name.to_string()))?;

    let subnet_id = first
        .subnets
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| PortError::SubnetNotFound(network_name.to_string()))?;

    Ok((network_id, subnet_id))
}

/// First port owned by `tenant_id` named `name`
pub async fn find_port(
    network: &dyn NetworkService,
    tenant_id: &str,
    name: &str,
) -> Result<Option<Port>> {
    let ports = network
        .list_ports(tenant_id, name)
        .await
        .map_err(PortError::ListPorts)?;
    Ok(ports.into_iter().next())
}

/// Build the create request; the fixed IP is bound to the resolved subnet.
pub fn new_port(params: &ModuleParams, context: &Context) -> NewPort {
    let fixed_ips = params.fixed_ip.as_ref().map(|ip| {
        vec![FixedIp {
            ip_address: ip.clone(),
            subnet_id: Some(context.subnet_id.clone()),
        }]
    });

    let allowed_address_pairs = if params.allowed_ip_addrs.is_empty() {
        None
    } else {
        Some(
            params
                .allowed_ip_addrs
                .iter()
                .map(|ip| AllowedAddressPair {
                    ip_address: ip.clone(),
                    mac_address: None,
                })
                .collect(),
        )
    };

    NewPort {
        name: params.name.clone(),
        tenant_id: context.tenant_id.clone(),
        network_id: context.network_id.clone(),
        admin_state_up: params.admin_state_up,
        fixed_ips,
        allowed_address_pairs,
    }
}

pub async fn create_port(network: &dyn NetworkService, port: &NewPort) -> Result<Port> {
    network.create_port(port).await.map_err(PortError::CreatePort)
}

pub async fn delete_port(network: &dyn NetworkService, port_id: &str) -> Result<()> {
    network
        .delete_port(port_id)
        .await
        .map_err(PortError::DeletePort)
}

/// Resolve the tenant, then the network
pub async fn resolve(
    identity: &dyn IdentityService,
    network: &dyn NetworkService,
    params: &ModuleParams,
) -> Result<Context> {
    let tenant_name = params.target_tenant();
    let tenant_id = resolve_tenant(identity, tenant_name).await?;
    tracing::info!(tenant = %tenant_name, tenant_id = %tenant_id, "resolved tenant");

    let (network_id, subnet_id) = resolve_network(network, &params.network_name).await?;
    tracing::info!(
        network = %params.network_name,
        network_id = %network_id,
        subnet_id = %subnet_id,
        "resolved network"
    );

    Ok(Context {
        tenant_id,
        network_id,
        subnet_id,
    })
}

/// Drive the port to the desired state against the given services
pub async fn reconcile(
    identity: &dyn IdentityService,
    network: &dyn NetworkService,
    params: &ModuleParams,
) -> Result<Outcome> {
    let context = resolve(identity, network, params).await?;
    let existing = find_port(network, &context.tenant_id, &params.name).await?;

    match (params.state, existing) {
        (State::Present, Some(port)) => {
            tracing::info!(port = %params.name, port_id = %port.id, "port already present");
            Ok(Outcome::unchanged(Some(port)))
        }
        (State::Present, None) => {
            if params.check_mode {
                tracing::info!(port = %params.name, "check mode: port would be created");
                return Ok(Outcome {
                    changed: true,
                    result: Action::Created,
                    port: None,
                });
            }
            let port = create_port(network, &new_port(params, &context)).await?;
            tracing::info!(port = %params.name, port_id = %port.id, "created port");
            Ok(Outcome {
                changed: true,
                result: Action::Created,
                port: Some(port),
            })
        }
        (State::Absent, None) => {
            tracing::info!(port = %params.name, "port already absent");
            Ok(Outcome::unchanged(None))
        }
        (State::Absent, Some(port)) => {
            if params.check_mode {
                tracing::info!(port = %params.name, port_id = %port.id, "check mode: port would be deleted");
            } else {
                delete_port(network, &port.id).await?;
                tracing::info!(port = %params.name, port_id = %port.id, "deleted port");
            }
            Ok(Outcome {
                changed: true,
                result: Action::Deleted,
                port: None,
            })
        }
    }
}

/// Authenticate, locate the network service and reconcile against the real
/// Keystone and Neutron APIs.
pub async fn run(params: &ModuleParams) -> Result<Outcome> {
    let timeout = Duration::from_secs(params.timeout);
    let credentials = Credentials {
        username: params.login_username.clone(),
        password: params.login_password.clone(),
        tenant_name: params.login_tenant_name.clone(),
        auth_url: params.auth_url.clone(),
    };

    tracing::info!(auth_url = %credentials.auth_url, user = %credentials.username, "authenticating");
    let keystone = KeystoneClient::authenticate(&credentials, params.region_name.as_deref(), timeout)
        .await
        .map_err(PortError::Authentication)?;

    let region = params.region_name.as_deref();
    let endpoint = keystone
        .session()
        .url_for(NETWORK_SERVICE_TYPE, Interface::Public, region)
        .ok_or_else(|| {
            PortError::Endpoint(match region {
                Some(r) => format!(
                    "no {} endpoint for service type '{}' in region '{}'",
                    Interface::Public.as_str(),
                    NETWORK_SERVICE_TYPE,
                    r
                ),
                None => format!(
                    "no {} endpoint for service type '{}'",
                    Interface::Public.as_str(),
                    NETWORK_SERVICE_TYPE
                ),
            })
        })?;
    tracing::debug!(endpoint = %endpoint, "network endpoint");

    let neutron = NeutronClient::new(endpoint, keystone.session().token(), timeout)
        .map_err(PortError::NetworkClient)?;

    reconcile(&keystone, &neutron, params).await
}
