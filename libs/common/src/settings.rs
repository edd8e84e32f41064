//! Layered service settings
//!
//! Defaults first, then `<PREFIX>_*` environment variables on top.

use serde::Deserialize;

use crate::error::InfraResult;

/// Listener settings shared by the service binaries
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    /// Socket address the HTTP listener binds to
    pub bind_address: String,
}

impl ServiceSettings {
    /// Load settings for a service, e.g. `load("MARKETPLACE", "0.0.0.0:3001")`
    /// honours `MARKETPLACE_BIND_ADDRESS`.
    pub fn load(prefix: &str, default_bind: &str) -> InfraResult<Self> {
        let settings = config::Config::builder()
            .set_default("bind_address", default_bind)?
            .add_source(config::Environment::with_prefix(prefix))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_bind_address() {
        unsafe {
            std::env::remove_var("SETTINGSTEST_BIND_ADDRESS");
        }

        let settings = ServiceSettings::load("SETTINGSTEST", "0.0.0.0:3000").unwrap();
        assert_eq!(settings.bind_address, "0.0.0.0:3000");
    }

    #[test]
    #[serial]
    fn test_environment_overrides_default() {
        unsafe {
            std::env::set_var("SETTINGSTEST_BIND_ADDRESS", "127.0.0.1:8080");
        }

        let settings = ServiceSettings::load("SETTINGSTEST", "0.0.0.0:3000").unwrap();
        assert_eq!(settings.bind_address, "127.0.0.1:8080");

        unsafe {
            std::env::remove_var("SETTINGSTEST_BIND_ADDRESS");
        }
    }
}
