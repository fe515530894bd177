// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use std::path::PathBuf;

use crate::app_config::Checkout;

/// Failures the commands report to the user.
#[derive(Debug, thiserror::Error)]
pub enum CommanderError {
    #[error("{checkout} checkout not found at '{}'", .path.display())]
    CheckoutNotFound { checkout: Checkout, path: PathBuf },

    #[error("{checkout} checkout at '{}' is not a git repository", .path.display())]
    NotARepository {
        checkout: Checkout,
        path: PathBuf,
        source: git2::Error,
    },

    #[error("could not drop database '{database}': {stderr}")]
    DropFailed { database: String, stderr: String },

    #[error("enterprise addons requested, but database '{0}' is not enterprise")]
    DatabaseNotEnterprise(String),

    #[error("no enterprise addons requested, but database '{0}' is enterprise")]
    DatabaseIsEnterprise(String),

    #[error("aborted")]
    Aborted,

    #[error("could not start '{program}'")]
    SpawnFailed {
        program: String,
        source: std::io::Error,
    },
}
