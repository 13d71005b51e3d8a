//! `-v`/`-q` flags controlling how much `novelgate` logs.
//!
//! By default only warnings and errors are shown.
//! - `-q` only shows errors
//! - `-v` adds info messages (one line per fetched target)
//! - `-vv` adds debug messages (throttling, cooldowns, retries)
//! - `-vvv` adds trace messages (every admission and cache hit)
//!
//! In the configuration file, the same can be set with a level name:
//!
//! ```toml
//! verbose = "debug"
//! ```

use log::{Level, LevelFilter};
use serde::Deserialize;
use std::fmt;

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// Pass many times for more log output
    ///
    /// By default, only warnings and errors are reported. Passing `-v` once
    /// also prints info messages, `-vv` enables debug logging and `-vvv`
    /// trace logging.
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet",
    )]
    verbose: u8,

    /// Less output per occurrence
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

impl Verbosity {
    /// Get the log level
    pub(crate) fn log_level(&self) -> Level {
        level_enum(self.verbosity())
    }

    /// Get the log level filter
    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        self.log_level().to_level_filter()
    }

    #[allow(clippy::cast_possible_wrap)]
    const fn verbosity(&self) -> i8 {
        level_value(Level::Warn) - (self.quiet as i8) + (self.verbose as i8)
    }
}

// A level name like "warn", "warning" or "Debug"
impl<'de> Deserialize<'de> for Verbosity {
    #[allow(clippy::cast_sign_loss)]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let level = match s.to_lowercase().as_str() {
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            level => {
                return Err(serde::de::Error::custom(format!(
                    "invalid log level `{level}`"
                )));
            }
        };

        let offset = level_value(level) - level_value(Level::Warn);
        Ok(if offset >= 0 {
            Verbosity {
                verbose: offset as u8,
                quiet: 0,
            }
        } else {
            Verbosity {
                verbose: 0,
                quiet: offset.unsigned_abs(),
            }
        })
    }
}

const fn level_value(level: Level) -> i8 {
    match level {
        Level::Error => 0,
        Level::Warn => 1,
        Level::Info => 2,
        Level::Debug => 3,
        Level::Trace => 4,
    }
}

const fn level_enum(verbosity: i8) -> Level {
    match verbosity {
        i8::MIN..=0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        _ => Level::Trace,
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.log_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[clap(flatten)]
        verbose: Verbosity,
    }

    #[test]
    fn verify_app() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(Verbosity::default().log_level(), Level::Warn);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from(["novelgate", "-vv"]);
        assert_eq!(cli.verbose.log_level(), Level::Debug);

        let cli = Cli::parse_from(["novelgate", "-qqq"]);
        assert_eq!(cli.verbose.log_level(), Level::Error);
    }

    #[test]
    fn test_deserialize_level() {
        #[derive(Deserialize)]
        struct Wrapper {
            verbose: Verbosity,
        }

        let wrapper: Wrapper = toml::from_str(r#"verbose = "Debug""#).unwrap();
        assert_eq!(wrapper.verbose.log_level(), Level::Debug);

        let wrapper: Wrapper = toml::from_str(r#"verbose = "error""#).unwrap();
        assert_eq!(wrapper.verbose.log_level(), Level::Error);

        assert!(toml::from_str::<Wrapper>(r#"verbose = "loud""#).is_err());
    }
}
