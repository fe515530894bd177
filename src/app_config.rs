// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display, EnumIter};

/// Default config file location, used when no `--config` flag is given.
pub const DEFAULT_CONFIG_FILE: &str = "~/.config/start-odoo/start-odoo.toml";

/// Prefix of environment variables that override config values.
///
/// Example of overriding: START_ODOO__DATABASE__NAME=otherdb
/// (Note double underscore to reach into lower struct levels!)
pub const ENV_PREFIX: &str = "START_ODOO_";

/// The addon checkouts the tool knows about, in listing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, AsRefStr, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Checkout {
    Community,
    Enterprise,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    pub checkouts: Checkouts,
    pub database: Database,
    pub server: Server,
}

impl AppConfig {
    pub fn checkout_path(&self, checkout: Checkout) -> &Path {
        match checkout {
            Checkout::Community => &self.checkouts.community,
            Checkout::Enterprise => &self.checkouts.enterprise,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Checkouts {
    pub community: PathBuf,
    pub enterprise: PathBuf,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Database {
    pub name: String,
    pub user: String,
    pub password: String,
    /// Program used to drop the test database.
    pub dropdb: String,
    /// Program used to query the test database.
    pub psql: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Server {
    /// Server entrypoint, relative to the community checkout.
    pub bin: PathBuf,
    /// Interpreter to run `bin` with, e.g. a virtualenv's python. When unset,
    /// `bin` is executed directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    /// Value for `--dev`. Empty disables the flag.
    pub dev: String,
}

/// Config with built-in defaults only.
pub fn default_settings() -> Result<config::Config> {
    let mut settings = config::Config::default();
    settings
        .set_default("checkouts.community", "community")?
        .set_default("checkouts.enterprise", "enterprise")?
        .set_default("database.name", "testdb")?
        .set_default("database.user", "odoo")?
        .set_default("database.password", "odoo")?
        .set_default("database.dropdb", "dropdb")?
        .set_default("database.psql", "psql")?
        .set_default("server.bin", "odoo-bin")?
        .set_default("server.dev", "all")?;
    Ok(settings)
}

/// Layer defaults, the config file and environment overrides.
///
/// A config file given on the command line must exist, the default one is
/// optional.
pub fn load_settings(config_file: Option<&str>) -> Result<config::Config> {
    let mut settings = default_settings()?;

    if let Some(config_file) = config_file {
        debug!("Loading config from {}", config_file);
        settings.merge(config::File::with_name(config_file))?;
    } else {
        let default_file = shellexpand::tilde(DEFAULT_CONFIG_FILE);
        debug!("Loading config from {} if present", default_file);
        settings.merge(config::File::with_name(&default_file).required(false))?;
    }

    settings.merge(config::Environment::with_prefix(ENV_PREFIX).separator("__"))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_defaults() {
        let config: AppConfig = default_settings().unwrap().try_into().unwrap();
        assert_eq!(config.checkouts.community, PathBuf::from("community"));
        assert_eq!(config.checkouts.enterprise, PathBuf::from("enterprise"));
        assert_eq!(config.database.name, "testdb");
        assert_eq!(config.database.user, "odoo");
        assert_eq!(config.database.password, "odoo");
        assert_eq!(config.server.bin, PathBuf::from("odoo-bin"));
        assert_eq!(config.server.python, None);
        assert_eq!(config.server.dev, "all");
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut settings = default_settings().unwrap();
        settings
            .merge(config::File::from_str(
                r#"
                [database]
                name = "crm_test"

                [server]
                python = "env15/bin/python"
                "#,
                config::FileFormat::Toml,
            ))
            .unwrap();
        let config: AppConfig = settings.try_into().unwrap();
        assert_eq!(config.database.name, "crm_test");
        assert_eq!(config.database.user, "odoo");
        assert_eq!(config.server.python.as_deref(), Some("env15/bin/python"));
        assert_eq!(config.server.bin, PathBuf::from("odoo-bin"));
    }

    #[test]
    fn test_missing_required_config_file() {
        let error = load_settings(Some("/nonexistent/start-odoo.toml"))
            .expect_err("Expected error due to missing config file");
        assert!(error.to_string().contains("not found"));
    }

    #[test]
    fn test_checkout_order_and_names() {
        let names: Vec<String> = Checkout::iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["community", "enterprise"]);
    }

    #[test]
    fn test_checkout_path() {
        let config: AppConfig = default_settings().unwrap().try_into().unwrap();
        assert_eq!(
            config.checkout_path(Checkout::Enterprise),
            Path::new("enterprise")
        );
    }
}
