//! Module parameters
//!
//! Parameters come from up to three places: the arguments file handed over
//! by the automation host, command-line flags (backed by the `OS_*`
//! environment variables) and the selected configuration profile. Each
//! source is read into a `RawParams`, the sources are merged with
//! `RawParams::or`, and `RawParams::validate` produces the `ModuleParams`
//! the rest of the module works with.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PortError, Result};

pub const MODULE_NAME: &str = "quantum_port";
pub const DEFAULT_AUTH_URL: &str = "http://127.0.0.1:35357/v2.0/";
pub const DEFAULT_LOGIN_USERNAME: &str = "admin";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const KNOWN_KEYS: &[&str] = &[
    "login_username",
    "login_password",
    "login_tenant_name",
    "tenant_name",
    "auth_url",
    "region_name",
    "state",
    "name",
    "network_name",
    "fixed_ip",
    "allowed_ip_addrs",
    "admin_state_up",
    "timeout",
];

const HOST_KEY_PREFIX: &str = "_ansible_";
const CHECK_MODE_KEY: &str = "_ansible_check_mode";

/// Desired port state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    #[default]
    Present,
    Absent,
}

impl FromStr for State {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "present" => Ok(State::Present),
            "absent" => Ok(State::Absent),
            other => Err(PortError::Params(format!(
                "value of state must be one of: present, absent, got: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Present => f.write_str("present"),
            State::Absent => f.write_str("absent"),
        }
    }
}

/// Validated parameters for one invocation
#[derive(Clone)]
pub struct ModuleParams {
    pub login_username: String,
    pub login_password: String,
    pub login_tenant_name: String,
    pub tenant_name: Option<String>,
    pub auth_url: String,
    pub region_name: Option<String>,
    pub state: State,
    pub name: String,
    pub network_name: String,
    pub fixed_ip: Option<String>,
    pub allowed_ip_addrs: Vec<String>,
    pub admin_state_up: bool,
    pub timeout: u64,
    pub check_mode: bool,
}

impl ModuleParams {
    /// Tenant that owns the port: `tenant_name`, or the login tenant when
    /// unset.
    pub fn target_tenant(&self) -> &str {
        self.tenant_name
            .as_deref()
            .unwrap_or(&self.login_tenant_name)
    }
}

impl fmt::Debug for ModuleParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleParams")
            .field("login_username", &self.login_username)
            .field("login_password", &"****")
            .field("login_tenant_name", &self.login_tenant_name)
            .field("tenant_name", &self.tenant_name)
            .field("auth_url", &self.auth_url)
            .field("region_name", &self.region_name)
            .field("state", &self.state)
            .field("name", &self.name)
            .field("network_name", &self.network_name)
            .field("fixed_ip", &self.fixed_ip)
            .field("allowed_ip_addrs", &self.allowed_ip_addrs)
            .field("admin_state_up", &self.admin_state_up)
            .field("timeout", &self.timeout)
            .field("check_mode", &self.check_mode)
            .finish()
    }
}

/// Parameters from a single source, every field optional
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawParams {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub login_tenant_name: Option<String>,
    pub tenant_name: Option<String>,
    pub auth_url: Option<String>,
    pub region_name: Option<String>,
    pub state: Option<String>,
    pub name: Option<String>,
    pub network_name: Option<String>,
    pub fixed_ip: Option<String>,
    pub allowed_ip_addrs: Option<Vec<String>>,
    pub admin_state_up: Option<bool>,
    pub timeout: Option<u64>,
    pub check_mode: Option<bool>,
}

impl RawParams {
    /// Read an arguments file: a JSON object, or `key=value` pairs
    pub fn from_args_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PortError::Params(format!(
                "unable to read arguments file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse_args(&content)
    }

    pub fn parse_args(content: &str) -> Result<Self> {
        let trimmed = content.trim();
        if trimmed.starts_with('{') {
            let map: Map<String, Value> = serde_json::from_str(trimmed)
                .map_err(|e| PortError::Params(format!("invalid JSON arguments: {}", e)))?;
            Self::from_map(map)
        } else {
            Self::from_map(parse_key_value(trimmed)?)
        }
    }

    pub fn from_map(mut map: Map<String, Value>) -> Result<Self> {
        let check_mode = match map.get(CHECK_MODE_KEY) {
            Some(value) => bool_value(CHECK_MODE_KEY, value)?,
            None => None,
        };
        map.retain(|key, _| !key.starts_with(HOST_KEY_PREFIX));

        let mut unsupported: Vec<&str> = map
            .keys()
            .map(String::as_str)
            .filter(|key| !KNOWN_KEYS.contains(key))
            .collect();
        if !unsupported.is_empty() {
            unsupported.sort_unstable();
            return Err(PortError::Params(format!(
                "Unsupported parameters for ({}) module: {}",
                MODULE_NAME,
                unsupported.join(", ")
            )));
        }

        let field = |key: &str| map.get(key);
        Ok(Self {
            login_username: string_field(&map, "login_username")?,
            login_password: string_field(&map, "login_password")?,
            login_tenant_name: string_field(&map, "login_tenant_name")?,
            tenant_name: string_field(&map, "tenant_name")?,
            auth_url: string_field(&map, "auth_url")?,
            region_name: string_field(&map, "region_name")?,
            state: string_field(&map, "state")?,
            name: string_field(&map, "name")?,
            network_name: string_field(&map, "network_name")?,
            fixed_ip: string_field(&map, "fixed_ip")?,
            allowed_ip_addrs: match field("allowed_ip_addrs") {
                Some(value) => list_value("allowed_ip_addrs", value)?,
                None => None,
            },
            admin_state_up: match field("admin_state_up") {
                Some(value) => bool_value("admin_state_up", value)?,
                None => None,
            },
            timeout: match field("timeout") {
                Some(value) => int_value("timeout", value)?,
                None => None,
            },
            check_mode,
        })
    }

    /// Fill every unset field from `fallback`
    pub fn or(self, fallback: RawParams) -> RawParams {
        RawParams {
            login_username: self.login_username.or(fallback.login_username),
            login_password: self.login_password.or(fallback.login_password),
            login_tenant_name: self.login_tenant_name.or(fallback.login_tenant_name),
            tenant_name: self.tenant_name.or(fallback.tenant_name),
            auth_url: self.auth_url.or(fallback.auth_url),
            region_name: self.region_name.or(fallback.region_name),
            state: self.state.or(fallback.state),
            name: self.name.or(fallback.name),
            network_name: self.network_name.or(fallback.network_name),
            fixed_ip: self.fixed_ip.or(fallback.fixed_ip),
            allowed_ip_addrs: self.allowed_ip_addrs.or(fallback.allowed_ip_addrs),
            admin_state_up: self.admin_state_up.or(fallback.admin_state_up),
            timeout: self.timeout.or(fallback.timeout),
            check_mode: self.check_mode.or(fallback.check_mode),
        }
    }

    /// Apply defaults and check required parameters
    pub fn validate(self) -> Result<ModuleParams> {
        let login_username = non_empty(self.login_username)
            .unwrap_or_else(|| DEFAULT_LOGIN_USERNAME.to_string());
        let login_password = non_empty(self.login_password);
        let login_tenant_name = non_empty(self.login_tenant_name);
        let name = non_empty(self.name);
        let network_name = non_empty(self.network_name);

        let missing: Vec<&str> = [
            ("login_password", login_password.is_none()),
            ("login_tenant_name", login_tenant_name.is_none()),
            ("name", name.is_none()),
            ("network_name", network_name.is_none()),
        ]
        .iter()
        .filter(|(_, absent)| *absent)
        .map(|(key, _)| *key)
        .collect();

        let (Some(login_password), Some(login_tenant_name), Some(name), Some(network_name)) =
            (login_password, login_tenant_name, name, network_name)
        else {
            return Err(PortError::Params(format!(
                "missing required arguments: {}",
                missing.join(", ")
            )));
        };

        if self.timeout == Some(0) {
            return Err(PortError::Params(
                "value of timeout must be a positive number of seconds".into(),
            ));
        }

        let state = match self.state {
            Some(state) => state.parse()?,
            None => State::default(),
        };

        Ok(ModuleParams {
            login_username,
            login_password,
            login_tenant_name,
            tenant_name: non_empty(self.tenant_name),
            auth_url: non_empty(self.auth_url).unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            region_name: non_empty(self.region_name),
            state,
            name,
            network_name,
            fixed_ip: non_empty(self.fixed_ip),
            allowed_ip_addrs: self.allowed_ip_addrs.unwrap_or_default(),
            admin_state_up: self.admin_state_up.unwrap_or(true),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS),
            check_mode: self.check_mode.unwrap_or(false),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn type_error(key: &str, value: &Value, expected: &str) -> PortError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    };
    PortError::Params(format!(
        "argument {} is of type {} and we were unable to convert to {}",
        key, found, expected
    ))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(type_error(key, other, "str")),
    }
}

fn bool_value(key: &str, value: &Value) -> Result<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => Ok(Some(true)),
            Some(v) if v == 0.0 => Ok(Some(false)),
            _ => Err(type_error(key, value, "bool")),
        },
        Value::String(s) => parse_bool(s)
            .map(Some)
            .ok_or_else(|| type_error(key, value, "bool")),
        other => Err(type_error(key, other, "bool")),
    }
}

/// Boolean spellings accepted by the automation host
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "on" | "1" | "true" | "t" => Some(true),
        "n" | "no" | "off" | "0" | "false" | "f" => Some(false),
        _ => None,
    }
}

fn list_value(key: &str, value: &Value) -> Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(split_list(s))),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(type_error(key, other, "list")),
            })
            .collect::<Result<Vec<_>>>()
            .map(|items| Some(items.into_iter().filter(|s| !s.is_empty()).collect())),
        other => Err(type_error(key, other, "list")),
    }
}

/// Split a comma separated list, dropping empty entries
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn int_value(key: &str, value: &Value) -> Result<Option<u64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| type_error(key, value, "int")),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| type_error(key, value, "int")),
        other => Err(type_error(key, other, "int")),
    }
}

/// Parse the legacy `key=value key2='quoted value'` argument form
fn parse_key_value(input: &str) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    let tokens = shell_words::split(input)
        .map_err(|e| PortError::Params(format!("unable to parse arguments: {}", e)))?;
    for token in tokens {
        let (key, value) = token.split_once('=').ok_or_else(|| {
            PortError::Params(format!(
                "this module requires key=value arguments, got: {}",
                token
            ))
        })?;
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(map)
}
