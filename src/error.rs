//! Module errors
//!
//! Every failure aborts the invocation. The display text of each variant is
//! the message reported in the failure payload.

use crate::client::ClientError;

/// Result type for module operations
pub type Result<T> = std::result::Result<T, PortError>;

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    Params(String),

    #[error("Error authenticating to the keystone: {0}")]
    Authentication(#[source] ClientError),

    #[error("Error getting network endpoint: {0}")]
    Endpoint(String),

    #[error("Error in connecting to neutron: {0}")]
    NetworkClient(#[source] ClientError),

    #[error("Error in listing keystone tenants: {0}")]
    ListTenants(#[source] ClientError),

    #[error("The tenant id cannot be found, please check the parameters")]
    TenantNotFound(String),

    #[error("Error in listing neutron networks: {0}")]
    ListNetworks(#[source] ClientError),

    #[error("The network cannot be found: {0}")]
    NetworkNotFound(String),

    #[error("The network id cannot be found: {0}")]
    NetworkIdMissing(String),

    #[error("The network subnet cannot be found: {0}")]
    SubnetNotFound(String),

    #[error("Error in listing neutron ports: {0}")]
    ListPorts(#[source] ClientError),

    #[error("Error in creating port: {0}")]
    CreatePort(#[source] ClientError),

    #[error("Error in deleting the port: {0}")]
    DeletePort(#[source] ClientError),

    #[error("Configuration error: {0}")]
    Config(String),
}
