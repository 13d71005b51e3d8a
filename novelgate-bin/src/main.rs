//! `novelgate` fetches extension modules, extension libraries and chapters
//! for a novel reader without hammering the sites serving them.
//!
//! The binary is a wrapper around novelgate-lib, which provides the per-host
//! request gate and the artifact caches.
//!
//! Fetch two chapters from the same site, one second apart:
//! ```sh
//! novelgate https://novels.example.com/chapter/1 https://novels.example.com/chapter/2
//! ```
//!
//! Fetch an extension module twice; the second pass is served from memory:
//! ```sh
//! novelgate --kind extension --passes 2 42=https://ext.example.com/42.js
//! ```
//!
//! Give up on targets whose host does not admit them within five seconds:
//! ```sh
//! novelgate --max-wait 5s --format json https://novels.example.com/chapter/1
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Error, Result, bail};
use clap::Parser;
use commands::CommandParams;
use formatters::get_stats_formatter;
use formatters::log::init_logging;
use formatters::stats::OutputStats;
use log::{error, info};
use novelgate_lib::cache::ArtifactCaches;
use novelgate_lib::fetch::Fetcher;
use novelgate_lib::ratelimit::HostGate;

mod client;
mod commands;
mod executor;
mod formatters;
mod options;
mod retry;
mod stats;
mod target;
mod verbosity;

use crate::executor::HttpExecutor;
use crate::options::{Config, NOVELGATE_CONFIG_FILE, NovelgateOptions};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator.
    #[allow(unused)]
    UnexpectedFailure = 1,
    FetchFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
fn load_config() -> Result<NovelgateOptions> {
    let mut opts = NovelgateOptions::parse();

    init_logging(&opts.config.verbose);

    // Load a potentially existing config file and merge it into the config from
    // the CLI
    if let Some(config_file) = &opts.config_file {
        match Config::load_from_file(config_file) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    config_file.display()
                );
            }
        }
    } else {
        // Without an explicit config file, the default one is used if it
        // exists. An invalid default file is still an error.
        let default_config = PathBuf::from(NOVELGATE_CONFIG_FILE);
        if default_config.is_file() {
            match Config::load_from_file(&default_config) {
                Ok(c) => opts.config.merge(c),
                Err(e) => {
                    bail!(
                        "Cannot load default configuration file `{}`: {e:?}",
                        default_config.display()
                    );
                }
            }
        }
    }

    Ok(opts)
}

/// Set up runtime and call novelgate entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let opts = match load_config() {
        Ok(opts) => opts,
        Err(e) => {
            error!("Error while loading config: {e}");
            exit(ExitCode::ConfigFile as i32);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    match runtime.block_on(run(opts)) {
        Err(e) if Some(ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Run novelgate on the given targets
async fn run(opts: NovelgateOptions) -> Result<i32> {
    let targets = opts.targets()?;
    let cfg = opts.config;

    let caches =
        ArtifactCaches::new(&cfg.cache_config()).context("Cannot set up the artifact caches")?;
    let gate = Arc::new(HostGate::new(cfg.gate_config()));
    let client = client::create(&cfg)?;
    let fetcher = Fetcher::new(gate.clone(), HttpExecutor::new(client, gate));

    info!(
        "Fetching {} target(s), at most one request per host every {}",
        targets.len(),
        humantime::format_duration(cfg.request_interval)
    );

    let params = CommandParams {
        fetcher,
        caches,
        targets,
        cfg,
    };
    let (fetch, exit_code) = commands::fetch(&params).await;

    let stats = OutputStats {
        fetch,
        caches: params.caches.stats(),
        hosts: params.fetcher.gate().all_host_stats(),
    };
    let formatted = get_stats_formatter(&params.cfg.format).format(stats)?;
    writeln!(io::stdout(), "{formatted}")?;

    Ok(exit_code as i32)
}
