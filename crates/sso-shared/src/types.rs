//! Common types

use serde::{Deserialize, Serialize};

/// Deployment environment, read from `app.env`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnv {
    #[default]
    Development,
    Production,
}

impl RuntimeEnv {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => RuntimeEnv::Production,
            _ => RuntimeEnv::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeEnv::Production)
    }
}
