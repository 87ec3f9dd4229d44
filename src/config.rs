//! Profile configuration
//!
//! Login settings can be kept in `~/.quantum-port/config.toml`, or in
//! `config.<profile>.toml` next to it, so they do not have to be repeated on
//! every invocation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PortError, Result};
use crate::params::RawParams;

pub const KEYS: &[&str] = &[
    "login_username",
    "login_password",
    "login_tenant_name",
    "auth_url",
    "region_name",
];

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub login_tenant_name: Option<String>,
    pub auth_url: Option<String>,
    pub region_name: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    /// A missing file yields the empty configuration
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| PortError::Config(e.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| PortError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| PortError::Config(e.to_string()))?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| PortError::Config(e.to_string()))?;
        fs::write(path, content).map_err(|e| PortError::Config(e.to_string()))
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PortError::Config("Cannot find home directory".into()))?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".quantum-port").join(filename))
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>> {
        let value = match key {
            "login_username" => &self.login_username,
            "login_password" => &self.login_password,
            "login_tenant_name" => &self.login_tenant_name,
            "auth_url" => &self.auth_url,
            "region_name" => &self.region_name,
            _ => return Err(PortError::Config(format!("Unknown config key: {}", key))),
        };
        Ok(value.as_deref())
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let slot = match key {
            "login_username" => &mut self.login_username,
            "login_password" => &mut self.login_password,
            "login_tenant_name" => &mut self.login_tenant_name,
            "auth_url" => &mut self.auth_url,
            "region_name" => &mut self.region_name,
            _ => return Err(PortError::Config(format!("Unknown config key: {}", key))),
        };
        *slot = Some(value);
        Ok(())
    }

    /// The profile as the lowest-precedence parameter source
    pub fn as_params(&self) -> RawParams {
        RawParams {
            login_username: self.login_username.clone(),
            login_password: self.login_password.clone(),
            login_tenant_name: self.login_tenant_name.clone(),
            auth_url: self.auth_url.clone(),
            region_name: self.region_name.clone(),
            ..Default::default()
        }
    }
}

/// Value as shown to the user; secrets are masked
pub fn display_value(key: &str, value: Option<&str>) -> String {
    match (key, value) {
        (_, None) => "(not set)".to_string(),
        ("login_password", Some(_)) => "****".to_string(),
        (_, Some(v)) => v.to_string(),
    }
}
