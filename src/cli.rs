// Copyright (c) 2021 Tangram Robotics Inc. - All Rights Reserved
// Unauthorized copying of this file, via any medium is strictly prohibited
// Proprietary and confidential
// ----------------------------

use anyhow::Result;
use clap::{crate_authors, crate_description, crate_version};
use clap::{Arg, ArgGroup, ArgMatches, Command};
use log::debug;
use std::io;

use crate::app_config::AppConfig;
use crate::core::commands;
use crate::core::server::LaunchOptions;

/// What a command line asks for.
#[derive(Debug, PartialEq)]
pub enum Mode {
    ListBranches,
    AllBranches,
    Status,
    CleanBranches,
    PrintConfig,
    Run {
        drop_db: bool,
        options: LaunchOptions,
    },
}

impl Mode {
    pub fn from_matches(matches: &ArgMatches) -> Mode {
        if matches.is_present("list_branches") {
            return Mode::ListBranches;
        }
        if matches.is_present("all_branches") {
            return Mode::AllBranches;
        }
        if matches.is_present("status") {
            return Mode::Status;
        }
        if matches.is_present("clean_branches") {
            return Mode::CleanBranches;
        }
        if matches.is_present("print_config") {
            return Mode::PrintConfig;
        }

        let web = matches.is_present("test_web");
        let options = LaunchOptions {
            enterprise: matches.is_present("enterprise"),
            test: matches.is_present("test") || web,
            web,
            // Never interpreted, so read as raw OS strings.
            odoo_args: matches
                .values_of_os("odoo_args")
                .map(|values| values.map(|v| v.to_os_string()).collect())
                .unwrap_or_default(),
        };
        Mode::Run {
            drop_db: matches.is_present("drop_db"),
            options,
        }
    }
}

/// Match commands
pub fn cli_match(config: config::Config, cli_matches: ArgMatches) -> Result<i32> {
    let config: AppConfig = config.try_into()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stdin = io::stdin();

    match Mode::from_matches(&cli_matches) {
        Mode::ListBranches => {
            // Unreadable checkouts are reported per entry, not as a failure.
            if !commands::list_branches(&config, &mut out, &mut io::stderr())? {
                debug!("Some checkouts could not be listed");
            }
            Ok(0)
        }
        Mode::AllBranches => {
            commands::show_all_branches(&config, &mut out)?;
            Ok(0)
        }
        Mode::Status => {
            commands::show_status(&config, &mut out)?;
            Ok(0)
        }
        Mode::CleanBranches => {
            commands::clean_branches(&config, &mut stdin.lock(), &mut out)?;
            Ok(0)
        }
        Mode::PrintConfig => {
            print!("{}", commands::print_config(&config)?);
            Ok(0)
        }
        Mode::Run { drop_db, options } => {
            commands::run_server(&config, drop_db, &options, &mut stdin.lock(), &mut out)
        }
    }
}

/// Configure Clap
pub fn build_cli() -> Command<'static> {
    Command::new("start-odoo")
        .version(crate_version!())
        .about(crate_description!())
        .author(crate_authors!("\n"))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Set a custom config file")
                .takes_value(true),
        )
        .arg(
            Arg::new("list_branches")
                .short('l')
                .long("list-branches")
                .help("Show the checked-out branch of each checkout"),
        )
        .arg(
            Arg::new("all_branches")
                .short('a')
                .long("all-branches")
                .help("Show all local branches of both checkouts"),
        )
        .arg(
            Arg::new("status")
                .short('s')
                .long("status")
                .help("Show Odoo version, database version and current branches"),
        )
        .arg(
            Arg::new("clean_branches")
                .long("clean-branches")
                .help("Interactively delete branches that are not checked out"),
        )
        .arg(
            Arg::new("print_config")
                .long("print-config")
                .help("Show configuration"),
        )
        .arg(
            Arg::new("drop_db")
                .short('d')
                .long("drop-db")
                .help("Drop the test database before starting"),
        )
        .arg(
            Arg::new("enterprise")
                .short('e')
                .long("enterprise")
                .help("Add the enterprise addons"),
        )
        .arg(
            Arg::new("test")
                .short('t')
                .long("test")
                .help("Run tests and stop"),
        )
        .arg(
            Arg::new("test_web")
                .short('w')
                .long("test-web")
                .visible_alias("web")
                .help("Run the web test suite (implies --test)"),
        )
        .arg(
            Arg::new("odoo_args")
                .value_name("ODOO_ARGS")
                .help("Arguments passed to odoo-bin as is")
                .takes_value(true)
                .multiple_values(true)
                .allow_invalid_utf8(true)
                .last(true),
        )
        .group(ArgGroup::new("mode").args(&[
            "list_branches",
            "all_branches",
            "status",
            "clean_branches",
            "print_config",
        ]))
}

/// Parse the process arguments. Usage errors exit here.
pub fn cli_config() -> Result<ArgMatches> {
    let cli_matches = build_cli().get_matches();

    Ok(cli_matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Mode, clap::Error> {
        let mut argv = vec!["start-odoo"];
        argv.extend_from_slice(args);
        build_cli()
            .try_get_matches_from(argv)
            .map(|matches| Mode::from_matches(&matches))
    }

    fn forwarded(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_cli_is_valid() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_no_args_runs_community() {
        assert_eq!(
            parse(&[]).unwrap(),
            Mode::Run {
                drop_db: false,
                options: LaunchOptions::default(),
            }
        );
    }

    #[test]
    fn test_list_branches() {
        assert_eq!(parse(&["-l"]).unwrap(), Mode::ListBranches);
        assert_eq!(parse(&["--list-branches"]).unwrap(), Mode::ListBranches);
    }

    #[test]
    fn test_drop_enterprise_with_forwarded_args() {
        assert_eq!(
            parse(&["-d", "--enterprise", "--", "-i", "crm"]).unwrap(),
            Mode::Run {
                drop_db: true,
                options: LaunchOptions {
                    enterprise: true,
                    test: false,
                    web: false,
                    odoo_args: forwarded(&["-i", "crm"]),
                },
            }
        );
    }

    #[test]
    fn test_test_web_implies_test() {
        for flag in &["--test-web", "--web", "-w"] {
            assert_eq!(
                parse(&[*flag]).unwrap(),
                Mode::Run {
                    drop_db: false,
                    options: LaunchOptions {
                        enterprise: false,
                        test: true,
                        web: true,
                        odoo_args: Vec::new(),
                    },
                }
            );
        }
    }

    #[test]
    fn test_forwarded_args_are_not_parsed() {
        assert_eq!(
            parse(&["--", "-l", "--bogus", "-d"]).unwrap(),
            Mode::Run {
                drop_db: false,
                options: LaunchOptions {
                    odoo_args: forwarded(&["-l", "--bogus", "-d"]),
                    ..LaunchOptions::default()
                },
            }
        );
    }

    #[test]
    fn test_forwarded_args_keep_spaces() {
        match parse(&["--", "--test-tags", "/crm, /sale"]).unwrap() {
            Mode::Run { options, .. } => {
                assert_eq!(options.odoo_args, forwarded(&["--test-tags", "/crm, /sale"]))
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        let error = parse(&["--bogus"]).unwrap_err();
        assert_eq!(error.kind(), clap::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_positional_without_separator_is_rejected() {
        assert!(parse(&["-i", "crm"]).is_err());
        assert!(parse(&["crm"]).is_err());
    }

    #[test]
    fn test_modes_are_exclusive() {
        let error = parse(&["-l", "--status"]).unwrap_err();
        assert_eq!(error.kind(), clap::ErrorKind::ArgumentConflict);
    }
}
