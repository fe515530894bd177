//! Checkout inspection, database helpers and server launch behind the CLI
//! commands.

pub(crate) mod checkouts;
pub(crate) mod commands;
pub(crate) mod database;
pub(crate) mod error;
pub(crate) mod prompt;
pub(crate) mod server;
