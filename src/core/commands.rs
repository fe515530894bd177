// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use anyhow::Result;
use colored::Colorize;
use git2::Repository;
use log::debug;
use std::io::{BufRead, Write};
use strum::IntoEnumIterator;

use super::checkouts::{self, BranchInfo};
use super::database;
use super::error::CommanderError;
use super::prompt::confirm;
use super::server::{self, LaunchOptions, ServerInvocation};
use crate::app_config::{AppConfig, Checkout};

fn open_all(config: &AppConfig) -> Result<Vec<(Checkout, Repository)>> {
    let mut repos = Vec::new();
    for checkout in Checkout::iter() {
        let repo = checkouts::open_checkout(checkout, config.checkout_path(checkout))?;
        repos.push((checkout, repo));
    }
    Ok(repos)
}

fn branch_table(repos: &[(Checkout, Repository)]) -> Result<Vec<BranchInfo>> {
    let borrowed: Vec<(Checkout, &Repository)> = repos.iter().map(|(c, r)| (*c, r)).collect();
    checkouts::collect_branches(&borrowed)
}

/// Print the checked-out branch of every checkout.
///
/// A checkout that cannot be read is reported on `err` and the listing goes
/// on. Returns whether every checkout was listed.
pub fn list_branches<W: Write, E: Write>(
    config: &AppConfig,
    out: &mut W,
    err: &mut E,
) -> Result<bool> {
    let mut all_listed = true;
    for checkout in Checkout::iter() {
        let branch = checkouts::open_checkout(checkout, config.checkout_path(checkout))
            .map_err(anyhow::Error::from)
            .and_then(|repo| checkouts::current_branch(&repo));
        match branch {
            Ok(branch) => writeln!(out, "{}: {}", checkout, branch)?,
            Err(e) => {
                all_listed = false;
                writeln!(err, "{}: {} {:#}", checkout, "error:".red(), e)?;
            }
        }
    }
    Ok(all_listed)
}

/// Print every local branch of both checkouts as a matrix.
pub fn show_all_branches<W: Write>(config: &AppConfig, out: &mut W) -> Result<()> {
    let repos = open_all(config)?;
    for branch in branch_table(&repos)? {
        writeln!(out, "{}", branch.matrix_row())?;
    }
    Ok(())
}

/// Print server version, database version and current branches.
pub fn show_status<W: Write>(config: &AppConfig, out: &mut W) -> Result<()> {
    let unknown = |e: anyhow::Error| {
        debug!("{:#}", e);
        String::from("?")
    };

    let server_version = server::odoo_version(config.checkout_path(Checkout::Community))
        .unwrap_or_else(unknown);
    let db_version = database::db_version(&config.database)
        .map(|v| v.to_string())
        .unwrap_or_else(unknown);

    writeln!(out, "{:<18} {}", "Odoo server:", server_version)?;
    writeln!(
        out,
        "{:<18} {}",
        format!("{} version:", config.database.name),
        db_version
    )?;

    for checkout in Checkout::iter() {
        let branch = checkouts::open_checkout(checkout, config.checkout_path(checkout))
            .map_err(anyhow::Error::from)
            .and_then(|repo| checkouts::branch_with_status(&repo))
            .unwrap_or_else(unknown);
        let mut label = format!("{} branch:", checkout);
        label[..1].make_ascii_uppercase();
        writeln!(out, "{:<18} {}", label, branch)?;
    }
    Ok(())
}

/// Offer to delete every branch that is not checked out anywhere.
pub fn clean_branches<R: BufRead, W: Write>(
    config: &AppConfig,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    let repos = open_all(config)?;
    let branches = branch_table(&repos)?;

    writeln!(out, "Branch cleaner tool")?;
    writeln!(out, "-------------------")?;
    writeln!(out, "Found {} branches\n", branches.len())?;

    for branch in branches {
        let name = branch.name.cyan();
        if branch.is_active() {
            writeln!(out, "skipping '{}' (currently in use)", name)?;
            continue;
        }

        let owners: Vec<&str> = branch.checkouts.iter().map(|c| c.as_ref()).collect();
        let question = format!("remove '{}' ({})?", name, owners.join(", "));
        if !confirm(input, out, &question, false)? {
            continue;
        }
        for (checkout, repo) in repos.iter().filter(|(c, _)| branch.checkouts.contains(c)) {
            checkouts::delete_branch(repo, &branch.name)?;
            writeln!(out, "Deleted branch {} in {}", branch.name, checkout)?;
        }
    }
    Ok(())
}

/// Effective configuration, as TOML.
pub fn print_config(config: &AppConfig) -> Result<String> {
    Ok(toml::to_string(config)?)
}

/// Warn when community and enterprise are on different branches. Returns
/// whether to go on.
fn confirm_matching_branches<R: BufRead, W: Write>(
    config: &AppConfig,
    input: &mut R,
    out: &mut W,
) -> Result<bool> {
    let community = checkouts::open_checkout(
        Checkout::Community,
        config.checkout_path(Checkout::Community),
    )?;
    let enterprise = checkouts::open_checkout(
        Checkout::Enterprise,
        config.checkout_path(Checkout::Enterprise),
    )?;
    let community_branch = checkouts::current_branch(&community)?;
    let enterprise_branch = checkouts::current_branch(&enterprise)?;
    if community_branch == enterprise_branch {
        return Ok(true);
    }

    writeln!(
        out,
        "{} community and enterprise branches do not match: {} != {}",
        "Warning:".yellow(),
        community_branch.cyan(),
        enterprise_branch.cyan()
    )?;
    confirm(input, out, "do you want to continue?", true)
}

/// Refuse to start on a database of the other edition.
///
/// Skipped when the database cannot be queried.
fn check_database_edition(config: &AppConfig, enterprise: bool) -> Result<()> {
    let version = match database::db_version(&config.database) {
        Ok(version) => version,
        Err(e) => {
            debug!("Skipping database edition check: {:#}", e);
            return Ok(());
        }
    };
    let name = config.database.name.clone();
    match (version.enterprise, enterprise) {
        (true, false) => Err(CommanderError::DatabaseIsEnterprise(name).into()),
        (false, true) => Err(CommanderError::DatabaseNotEnterprise(name).into()),
        _ => Ok(()),
    }
}

/// Start the server, dropping the test database first if asked. Returns the
/// server's exit code.
pub fn run_server<R: BufRead, W: Write>(
    config: &AppConfig,
    drop_db: bool,
    options: &LaunchOptions,
    input: &mut R,
    out: &mut W,
) -> Result<i32> {
    if options.enterprise && !confirm_matching_branches(config, input, out)? {
        return Err(CommanderError::Aborted.into());
    }

    if drop_db {
        database::drop_database(&config.database)?;
    } else {
        check_database_edition(config, options.enterprise)?;
    }

    ServerInvocation::compose(config, options).launch()
}
