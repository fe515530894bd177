// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Test database helpers. The database engine is only reached through its
//! own command-line tools.

use anyhow::{anyhow, bail, Result};
use log::{debug, info};
use std::fmt;
use std::process::{Command, Output};

use super::error::CommanderError;
use crate::app_config::Database;

const VERSION_QUERY: &str = "SELECT latest_version FROM ir_module_module WHERE name='base'";
const ENTERPRISE_QUERY: &str =
    "SELECT license FROM ir_module_module WHERE name='web_enterprise' AND state='installed'";

/// Odoo series a database was last updated with.
#[derive(Clone, Debug, PartialEq)]
pub struct DbVersion {
    /// e.g. `16.0` or `saas~16.3`
    pub series: String,
    pub enterprise: bool,
}

impl fmt::Display for DbVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enterprise {
            write!(f, "{} (enterprise)", self.series)
        } else {
            write!(f, "{}", self.series)
        }
    }
}

fn run(program: &str, command: &mut Command) -> Result<Output, CommanderError> {
    debug!("Running {:?}", command);
    command.output().map_err(|source| CommanderError::SpawnFailed {
        program: program.to_owned(),
        source,
    })
}

/// Drop the test database with the configured `dropdb` tool.
pub fn drop_database(config: &Database) -> Result<()> {
    info!("Dropping database {}", config.name);
    let output = run(
        &config.dropdb,
        Command::new(&config.dropdb).arg(&config.name),
    )?;

    if !output.status.success() {
        return Err(CommanderError::DropFailed {
            database: config.name.clone(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        }
        .into());
    }
    Ok(())
}

fn query(config: &Database, sql: &str) -> Result<String> {
    let output = run(
        &config.psql,
        Command::new(&config.psql)
            .args(&["-X", "-t", "-A", "-d"])
            .arg(&config.name)
            .args(&["-c", sql]),
    )?;
    if !output.status.success() {
        bail!(
            "query on '{}' failed: {}",
            config.name,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

/// Major and minor components of a module version, `16.0.1.3` -> `16.0`.
pub fn parse_series(latest_version: &str) -> Option<String> {
    let mut parts = latest_version.trim().split('.');
    let major = parts.next().filter(|p| !p.is_empty())?;
    let minor = parts.next().filter(|p| !p.is_empty())?;
    Some(format!("{}.{}", major, minor))
}

/// Read the series and edition of the test database.
pub fn db_version(config: &Database) -> Result<DbVersion> {
    let latest_version = query(config, VERSION_QUERY)?;
    let series = parse_series(&latest_version)
        .ok_or_else(|| anyhow!("unexpected base module version {:?}", latest_version))?;
    let enterprise = !query(config, ENTERPRISE_QUERY)?.is_empty();
    Ok(DbVersion { series, enterprise })
}
