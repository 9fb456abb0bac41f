//! Greeting payload returned by `GET /`.

use serde::Serialize;

use crate::config::{AppSettings, Secret};

pub const GREETING_MESSAGE: &str = "Hello from Azni!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub message: &'static str,
    pub config: Option<String>,
    pub db_credentials: DbCredentials,
}

/// Credentials view. The password is only ever the mask or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbCredentials {
    pub password: Option<&'static str>,
}

impl Greeting {
    pub fn from_settings(settings: &AppSettings) -> Self {
        let password = settings
            .db_password
            .as_ref()
            .filter(|secret| !secret.is_empty())
            .map(|_| Secret::MASK);

        Self {
            message: GREETING_MESSAGE,
            config: settings.app_config.clone(),
            db_credentials: DbCredentials { password },
        }
    }
}
