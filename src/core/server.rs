// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

//! Composition and launch of the Odoo server process.

use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::{Command, ExitStatus};

use super::error::CommanderError;
use crate::app_config::{AppConfig, Checkout};

/// Tags selecting the web client's test suite.
pub const WEB_TEST_TAGS: &str = "/web:WebSuite";

lazy_static! {
    static ref VERSION_INFO: Regex =
        Regex::new(r"(?m)^version_info\s*=\s*\(([^)]*)\)").unwrap();
}

/// What the user asked the server run to look like.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LaunchOptions {
    pub enterprise: bool,
    pub test: bool,
    pub web: bool,
    /// Passed to the server untouched, after every composed flag.
    pub odoo_args: Vec<OsString>,
}

impl LaunchOptions {
    /// The web suite only runs in test mode.
    pub fn runs_tests(&self) -> bool {
        self.test || self.web
    }
}

/// A fully composed server command line.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerInvocation {
    pub program: OsString,
    pub args: Vec<OsString>,
}

/// Comma-separated `--addons-path` value.
pub fn addons_path(config: &AppConfig, enterprise: bool) -> OsString {
    let mut path = config
        .checkout_path(Checkout::Community)
        .join("addons")
        .into_os_string();
    if enterprise {
        path.push(",");
        path.push(config.checkout_path(Checkout::Enterprise));
    }
    path
}

impl ServerInvocation {
    pub fn compose(config: &AppConfig, options: &LaunchOptions) -> ServerInvocation {
        let entrypoint = config
            .checkout_path(Checkout::Community)
            .join(&config.server.bin)
            .into_os_string();
        let db = &config.database;

        let mut args: Vec<OsString> = Vec::new();
        let program = match &config.server.python {
            Some(python) => {
                args.push(entrypoint);
                OsString::from(python)
            }
            None => entrypoint,
        };

        args.push("-r".into());
        args.push(db.user.as_str().into());
        args.push("-w".into());
        args.push(db.password.as_str().into());
        args.push("-d".into());
        args.push(db.name.as_str().into());
        args.push(format!("--db-filter={}", db.name).into());
        if !config.server.dev.is_empty() {
            args.push(format!("--dev={}", config.server.dev).into());
        }
        args.push("--addons-path".into());
        args.push(addons_path(config, options.enterprise));

        if options.runs_tests() {
            args.push("--test-enable".into());
            args.push("--stop-after-init".into());
        }
        if options.web {
            args.push("--test-tags".into());
            args.push(WEB_TEST_TAGS.into());
        }

        args.extend(options.odoo_args.iter().cloned());

        ServerInvocation { program, args }
    }

    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Run the server in the foreground and return its exit code.
    pub fn launch(&self) -> Result<i32> {
        info!("Starting {}", self.program.to_string_lossy());
        debug!("Server arguments: {:?}", self.args);
        let status = self
            .command()
            .status()
            .map_err(|source| CommanderError::SpawnFailed {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;
        debug!("Server exited with {}", status);
        Ok(exit_code(status))
    }
}

/// Exit code of a finished child. Signals map to `128 + signal` on Unix.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

fn release_level(level: &str) -> &str {
    match level {
        "ALPHA" => "alpha",
        "BETA" => "beta",
        "RELEASE_CANDIDATE" => "rc",
        _ => "",
    }
}

/// Server version from the `version_info` tuple of a `release.py` file.
///
/// `(16, 0, 0, FINAL, 0, '')` gives `16.0`, `(17, 0, 0, ALPHA, 1, '')` gives
/// `17.0alpha1`.
pub fn parse_release(release_py: &str) -> Option<String> {
    let captures = VERSION_INFO.captures(release_py)?;
    let items: Vec<&str> = captures[1]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '\'' || c == '"'))
        .collect();
    if items.len() < 2 || items[0].is_empty() {
        return None;
    }

    let mut version = format!("{}.{}", items[0], items[1]);
    if let Some(level) = items.get(3) {
        version.push_str(release_level(level));
    }
    if let Some(serial) = items.get(4).filter(|s| !s.is_empty() && **s != "0") {
        version.push_str(serial);
    }
    if let Some(suffix) = items.get(5) {
        version.push_str(suffix);
    }
    Some(version)
}

/// Version of the server in a community checkout.
pub fn odoo_version(community: &Path) -> Result<String> {
    let release_file = community.join("odoo").join("release.py");
    let contents = fs::read_to_string(&release_file)
        .with_context(|| format!("Cannot read {}", release_file.display()))?;
    parse_release(&contents)
        .ok_or_else(|| anyhow!("No version_info in {}", release_file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::default_settings;
    use tempfile::TempDir;

    fn config() -> AppConfig {
        default_settings().unwrap().try_into().unwrap()
    }

    fn strings(invocation: &ServerInvocation) -> Vec<String> {
        invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_compose_community() {
        let invocation = ServerInvocation::compose(&config(), &LaunchOptions::default());
        assert_eq!(invocation.program, OsString::from("community/odoo-bin"));
        assert_eq!(
            strings(&invocation),
            vec![
                "-r",
                "odoo",
                "-w",
                "odoo",
                "-d",
                "testdb",
                "--db-filter=testdb",
                "--dev=all",
                "--addons-path",
                "community/addons",
            ]
        );
    }

    #[test]
    fn test_compose_enterprise_with_forwarded_args() {
        let options = LaunchOptions {
            enterprise: true,
            odoo_args: vec!["-i".into(), "crm".into()],
            ..LaunchOptions::default()
        };
        let args = strings(&ServerInvocation::compose(&config(), &options));
        let addons = args.iter().position(|a| a == "--addons-path").unwrap();
        assert_eq!(args[addons + 1], "community/addons,enterprise");
        assert_eq!(&args[args.len() - 2..], &["-i", "crm"]);
    }

    #[test]
    fn test_compose_web_tests() {
        let options = LaunchOptions {
            web: true,
            ..LaunchOptions::default()
        };
        assert!(options.runs_tests());
        let args = strings(&ServerInvocation::compose(&config(), &options));
        assert_eq!(
            &args[args.len() - 4..],
            &["--test-enable", "--stop-after-init", "--test-tags", WEB_TEST_TAGS]
        );
    }

    #[test]
    fn test_compose_tests_without_web() {
        let options = LaunchOptions {
            test: true,
            odoo_args: vec!["--test-tags".into(), "/crm".into()],
            ..LaunchOptions::default()
        };
        let args = strings(&ServerInvocation::compose(&config(), &options));
        assert_eq!(
            &args[args.len() - 4..],
            &["--test-enable", "--stop-after-init", "--test-tags", "/crm"]
        );
        assert!(!args.iter().any(|a| a == WEB_TEST_TAGS));
    }

    #[test]
    fn test_compose_with_interpreter_and_no_dev() {
        let mut config = config();
        config.server.python = Some(String::from("env15/bin/python"));
        config.server.dev = String::new();
        let invocation = ServerInvocation::compose(&config, &LaunchOptions::default());
        let args = strings(&invocation);
        assert_eq!(invocation.program, OsString::from("env15/bin/python"));
        assert_eq!(args[0], "community/odoo-bin");
        assert!(!args.iter().any(|a| a.starts_with("--dev")));
    }

    #[cfg(unix)]
    #[test]
    fn test_launch_returns_exit_code() {
        let invocation = ServerInvocation {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 3".into()],
        };
        assert_eq!(invocation.launch().unwrap(), 3);
    }

    #[test]
    fn test_launch_missing_program() {
        let invocation = ServerInvocation {
            program: "/nonexistent/odoo-bin".into(),
            args: Vec::new(),
        };
        assert!(invocation.launch().is_err());
    }

    #[test]
    fn test_parse_release() {
        let release = "RELEASE_LEVELS = [ALPHA, BETA, RELEASE_CANDIDATE, FINAL]\n\
                       version_info = (16, 0, 0, FINAL, 0, '')\n";
        assert_eq!(parse_release(release), Some(String::from("16.0")));
        assert_eq!(
            parse_release("version_info = ('saas~16', 4, 0, FINAL, 0, '')"),
            Some(String::from("saas~16.4"))
        );
        assert_eq!(
            parse_release("version_info = (17, 0, 0, ALPHA, 1, 'e')"),
            Some(String::from("17.0alpha1e"))
        );
        assert_eq!(parse_release("serie = '16.0'"), None);
    }

    #[test]
    fn test_odoo_version_from_checkout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("odoo")).unwrap();
        fs::write(
            dir.path().join("odoo").join("release.py"),
            "version_info = (15, 0, 0, FINAL, 0, '')\n",
        )
        .unwrap();
        assert_eq!(odoo_version(dir.path()).unwrap(), "15.0");
        assert!(odoo_version(&dir.path().join("missing")).is_err());
    }
}
