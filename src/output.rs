//! Output formatting
//!
//! The automation host reads the result payload from stdout, so only the
//! payload is ever printed there.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn render<T: Serialize>(&self, data: &T) -> String {
        match self {
            OutputFormat::Json => serde_json::to_string(data).unwrap_or_default(),
            OutputFormat::Yaml => serde_yaml::to_string(data).unwrap_or_default(),
        }
    }

    pub fn print<T: Serialize>(&self, data: &T) {
        println!("{}", self.render(data));
    }
}

/// Payload reported when the run fails
#[derive(Debug, Serialize)]
pub struct Failure {
    pub failed: bool,
    pub msg: String,
}

impl Failure {
    pub fn new(error: &impl std::fmt::Display) -> Self {
        Self {
            failed: true,
            msg: error.to_string(),
        }
    }
}
