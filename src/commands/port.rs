//! Port command

use std::path::Path;

use clap::Args;
use quantum_port::config::Config;
use quantum_port::params::{parse_bool, RawParams};
use quantum_port::{reconcile, Outcome, Result};

/// Module parameters as command-line flags
#[derive(Args, Default)]
pub struct PortArgs {
    /// Login username for the identity service
    #[arg(long, env = "OS_USERNAME")]
    login_username: Option<String>,

    /// Password of the login user
    #[arg(long, env = "OS_PASSWORD", hide_env_values = true)]
    login_password: Option<String>,

    /// Tenant of the login user
    #[arg(long, env = "OS_TENANT_NAME")]
    login_tenant_name: Option<String>,

    /// Tenant that owns the port (defaults to the login tenant)
    #[arg(long)]
    tenant_name: Option<String>,

    /// Identity service URL
    #[arg(long, env = "OS_AUTH_URL")]
    auth_url: Option<String>,

    /// Region used to pick catalog endpoints
    #[arg(long, env = "OS_REGION_NAME")]
    region_name: Option<String>,

    /// Desired state: present or absent
    #[arg(long)]
    state: Option<String>,

    /// Port name
    #[arg(long)]
    name: Option<String>,

    /// Network the port is attached to
    #[arg(long)]
    network_name: Option<String>,

    /// Fixed IP address for the port
    #[arg(long)]
    fixed_ip: Option<String>,

    /// Additional IP addresses allowed on the port (comma separated)
    #[arg(long, value_delimiter = ',')]
    allowed_ip_addrs: Vec<String>,

    /// Administrative state of the port
    #[arg(long, value_parser = parse_bool_flag)]
    admin_state_up: Option<bool>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Report what would change without changing anything
    #[arg(long)]
    check: bool,
}

fn parse_bool_flag(s: &str) -> std::result::Result<bool, String> {
    parse_bool(s).ok_or_else(|| format!("invalid boolean: {}", s))
}

impl PortArgs {
    fn into_params(self) -> RawParams {
        let allowed_ip_addrs: Vec<String> = self
            .allowed_ip_addrs
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        RawParams {
            login_username: self.login_username,
            login_password: self.login_password,
            login_tenant_name: self.login_tenant_name,
            tenant_name: self.tenant_name,
            auth_url: self.auth_url,
            region_name: self.region_name,
            state: self.state,
            name: self.name,
            network_name: self.network_name,
            fixed_ip: self.fixed_ip,
            allowed_ip_addrs: (!allowed_ip_addrs.is_empty()).then_some(allowed_ip_addrs),
            admin_state_up: self.admin_state_up,
            timeout: self.timeout,
            check_mode: self.check.then_some(true),
        }
    }
}

/// Gather parameters (arguments file, then flags, then profile) and run the
/// module.
pub async fn handle(args_file: Option<&Path>, args: PortArgs, profile: Option<&str>) -> Result<Outcome> {
    let from_file = match args_file {
        Some(path) => RawParams::from_args_file(path)?,
        None => RawParams::default(),
    };

    let config = match Config::load(profile) {
        Ok(config) => config,
        Err(e) if profile.is_none() => {
            tracing::warn!(error = %e, "ignoring unreadable default profile");
            Config::default()
        }
        Err(e) => return Err(e),
    };

    let params = from_file
        .or(args.into_params())
        .or(config.as_params())
        .validate()?;
    tracing::debug!(?params, "module parameters");

    reconcile::run(&params).await
}
