// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Read-only inspection of the addon checkouts, plus branch deletion for the
//! branch cleaner.

use anyhow::Result;
use git2::{BranchType, Repository, StatusOptions};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

use super::error::CommanderError;
use crate::app_config::Checkout;

const HEADS_PREFIX: &str = "refs/heads/";

/// Open the git repository of a checkout.
///
/// Only `path` itself is considered; parent directories are not searched.
pub fn open_checkout(checkout: Checkout, path: &Path) -> Result<Repository, CommanderError> {
    debug!("Opening {} checkout at {}", checkout, path.display());
    if !path.is_dir() {
        return Err(CommanderError::CheckoutNotFound {
            checkout,
            path: path.to_owned(),
        });
    }
    Repository::open(path).map_err(|source| CommanderError::NotARepository {
        checkout,
        path: path.to_owned(),
        source,
    })
}

/// Name of the checked-out branch.
///
/// Works on a branch without commits yet. A detached HEAD is described with
/// its abbreviated commit id.
pub fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.find_reference("HEAD")?;
    if let Some(target) = head.symbolic_target() {
        return Ok(target.trim_start_matches(HEADS_PREFIX).to_owned());
    }
    match head.target() {
        Some(oid) => {
            let id = oid.to_string();
            Ok(format!("HEAD detached at {}", &id[..7]))
        }
        None => Ok(String::from("HEAD")),
    }
}

/// Whether the working tree has modified, staged or untracked files.
pub fn is_dirty(repo: &Repository) -> Result<bool> {
    let mut options = StatusOptions::new();
    options.include_untracked(true).include_ignored(false);
    let statuses = repo.statuses(Some(&mut options))?;
    Ok(!statuses.is_empty())
}

/// Current branch, suffixed with ` (*)` when the checkout is dirty.
pub fn branch_with_status(repo: &Repository) -> Result<String> {
    let branch = current_branch(repo)?;
    if is_dirty(repo)? {
        Ok(format!("{} (*)", branch))
    } else {
        Ok(branch)
    }
}

/// Local branch names with a flag telling whether each is checked out.
pub fn local_branches(repo: &Repository) -> Result<Vec<(String, bool)>> {
    let mut branches = Vec::new();
    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        if let Some(name) = branch.name()? {
            branches.push((name.to_owned(), branch.is_head()));
        }
    }
    Ok(branches)
}

/// Force-delete a local branch, whether merged or not.
pub fn delete_branch(repo: &Repository, name: &str) -> Result<()> {
    debug!("Deleting branch {} in {:?}", name, repo.workdir());
    repo.find_branch(name, BranchType::Local)?.delete()?;
    Ok(())
}

/// A local branch and where it lives across the checkouts.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchInfo {
    pub name: String,
    /// Checkouts having this branch, in checkout order.
    pub checkouts: Vec<Checkout>,
    /// Checkouts where this branch is checked out.
    pub checked_out: Vec<Checkout>,
}

impl BranchInfo {
    pub fn is_active(&self) -> bool {
        !self.checked_out.is_empty()
    }

    /// Two-character cell, e.g. `X*` for a branch present and checked out.
    pub fn cell(&self, checkout: Checkout) -> String {
        let present = if self.checkouts.contains(&checkout) { 'X' } else { ' ' };
        let active = if self.checked_out.contains(&checkout) { '*' } else { ' ' };
        format!("{}{}", present, active)
    }

    /// Row of the branch matrix: `CC EE | name`.
    pub fn matrix_row(&self) -> String {
        format!(
            "{} {} | {}",
            self.cell(Checkout::Community),
            self.cell(Checkout::Enterprise),
            self.name
        )
    }
}

/// Merge local branches of several checkouts into one list sorted by name.
pub fn collect_branches(repos: &[(Checkout, &Repository)]) -> Result<Vec<BranchInfo>> {
    let mut merged: BTreeMap<String, BranchInfo> = BTreeMap::new();
    for (checkout, repo) in repos {
        for (name, is_head) in local_branches(repo)? {
            let info = merged.entry(name.clone()).or_insert_with(|| BranchInfo {
                name,
                checkouts: Vec::new(),
                checked_out: Vec::new(),
            });
            info.checkouts.push(*checkout);
            if is_head {
                info.checked_out.push(*checkout);
            }
        }
    }
    Ok(merged.into_iter().map(|(_, info)| info).collect())
}
