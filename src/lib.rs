//! start-odoo is a Command Line Interface (CLI) for starting an Odoo
//! development server out of local community/enterprise checkouts.
//!
//! It composes the `odoo-bin` command line (database, credentials, addons
//! path, test flags), optionally drops the test database first, and reports
//! which branches the checkouts are on.
//!
//! # Usage
//!
//! View CLI help with `start-odoo --help`.
//!
//! ## Configuration
//!
//! Every setting has a default, so a configuration file is optional. To use
//! one, either:
//!
//! - Place the configuration file at `~/.config/start-odoo/start-odoo.toml`
//! - Use the `--config path/to/start-odoo.toml` flag
//!
//! ```toml
//! [checkouts]
//! community = "community"
//! enterprise = "enterprise"
//!
//! [database]
//! name = "testdb"
//! user = "odoo"
//! password = "odoo"
//! dropdb = "dropdb"
//! psql = "psql"
//!
//! [server]
//! bin = "odoo-bin"
//! python = "env15/bin/python"
//! dev = "all"
//! ```
//!
//! Any value can be overridden with an environment variable, e.g.
//! `START_ODOO__DATABASE__NAME=crm_test`.
//!
//! ## Commands
//!
//! ```start-odoo [-d] [-e] [-t | -w] [-- <odoo args>...]```
//!
//! Starts the server with the community addons, plus the enterprise addons
//! with `-e`. `-d` drops the test database first. `-t` runs the tests of the
//! installed modules and stops, `-w` runs the web client's test suite.
//! Everything after `--` is handed to `odoo-bin` untouched, e.g.
//! `start-odoo -d -- -i crm`.
//!
//! The exit code is the server's exit code.
//!
//! <br>
//!
//! ---
//!
//! ```start-odoo -l```
//!
//! Prints the checked-out branch of the community and enterprise checkouts.
//! A checkout that cannot be read is reported and the others are still
//! listed.
//!
//! <br>
//!
//! ---
//!
//! ```start-odoo -a```
//!
//! Prints every local branch of both checkouts. `X` marks the checkouts
//! having the branch, `*` where it is checked out:
//!
//! ```text
//! X* X* | 16.0
//! X     | 16.0-fix-crm
//! ```
//!
//! <br>
//!
//! ---
//!
//! ```start-odoo -s```
//!
//! Prints the server version, the test database version and the branches of
//! both checkouts. `(*)` marks a checkout with local changes.
//!
//! <br>
//!
//! ---
//!
//! ```start-odoo --clean-branches```
//!
//! Asks, branch by branch, whether to delete the local branches that are not
//! checked out anywhere.
//!
//! <br>
//!
//! ---
//!
//! ```start-odoo --print-config```
//!
//! Echoes current config (with any overrides applied) and exits.

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;

mod app_config;
mod cli;
mod core;

use anyhow::Result;

#[doc(hidden)]
/// Main entrypoint, returns the process exit code.
pub fn run() -> Result<i32> {
    // Human Panic. Only enabled when *not* debugging.
    //
    // Example of what panic message looks like:
    // https://docs.rs/human-panic/1.0.3/human_panic/
    #[cfg(not(debug_assertions))]
    {
        setup_panic!();
    }

    // Better Panic. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        better_panic::Settings::debug()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .install();
    }

    env_logger::init();

    // Get CLI arguments and flags (one may have provided the config file to use)
    let cli_matches = cli::cli_config()?;

    let settings = app_config::load_settings(cli_matches.value_of("config"))?;

    cli::cli_match(settings, cli_matches)
}
