use crate::target::Target;
use crate::verbosity::Verbosity;
use anyhow::{Context, Error, Result, anyhow};
use clap::builder::PossibleValuesParser;
use clap::{Parser, builder::TypedValueParser};
use const_format::{concatcp, formatcp};
use novelgate_lib::ArtifactKind;
use novelgate_lib::cache::{
    CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_MAX_CHAPTERS, DEFAULT_MAX_EXTENSIONS,
    DEFAULT_MAX_LIBRARIES,
};
use novelgate_lib::ratelimit::{DEFAULT_REQUEST_INTERVAL, GateConfig};
use serde::Deserialize;
use std::path::Path;
use std::{fs, path::PathBuf, str::FromStr, time::Duration};
use strum::{Display, EnumIter, VariantNames};

pub(crate) const NOVELGATE_CONFIG_FILE: &str = "novelgate.toml";

pub(crate) const DEFAULT_USER_AGENT: &str = concat!("novelgate/", env!("CARGO_PKG_VERSION"));
const DEFAULT_PASSES: usize = 1;
const DEFAULT_MAX_CONCURRENCY: usize = 16;
const DEFAULT_MAX_RETRIES: u64 = 2;
const DEFAULT_TIMEOUT_SECS: usize = 20;

// this exists because clap requires `&str` type values for defaults
// whereas serde expects owned `String` types
const PASSES_STR: &str = concatcp!(DEFAULT_PASSES);
const MAX_CONCURRENCY_STR: &str = concatcp!(DEFAULT_MAX_CONCURRENCY);
const MAX_RETRIES_STR: &str = concatcp!(DEFAULT_MAX_RETRIES);
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const MAX_EXTENSIONS_STR: &str = concatcp!(DEFAULT_MAX_EXTENSIONS);
const MAX_LIBRARIES_STR: &str = concatcp!(DEFAULT_MAX_LIBRARIES);
const MAX_CHAPTERS_STR: &str = concatcp!(DEFAULT_MAX_CHAPTERS);
const REQUEST_INTERVAL_STR: &str = "1s";
const CACHE_TTL_STR: &str = "60s";

// Show the default config file in the help text while still being able to
// tell whether the user passed one explicitly. A missing default file is
// not an error, a missing explicit one is.
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    NOVELGATE_CONFIG_FILE,
);

/// The format to use for the final statistics
#[derive(Debug, Deserialize, Default, Clone, Display, EnumIter, VariantNames, PartialEq, Eq)]
#[non_exhaustive]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub(crate) enum StatsFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for StatsFormat {
    type Err = Error;

    fn from_str(format: &str) -> Result<Self, Self::Err> {
        match format.to_lowercase().as_str() {
            "compact" | "string" => Ok(StatsFormat::Compact),
            "json" => Ok(StatsFormat::Json),
            _ => Err(anyhow!("Unknown format {format}")),
        }
    }
}

// Macro for generating default functions to be used by serde
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

// Generate the functions for serde defaults
default_function! {
    passes: usize = DEFAULT_PASSES;
    max_concurrency: usize = DEFAULT_MAX_CONCURRENCY;
    max_retries: u64 = DEFAULT_MAX_RETRIES;
    max_extensions: usize = DEFAULT_MAX_EXTENSIONS;
    max_libraries: usize = DEFAULT_MAX_LIBRARIES;
    max_chapters: usize = DEFAULT_MAX_CHAPTERS;
    request_interval: Duration = DEFAULT_REQUEST_INTERVAL;
    cache_ttl: Duration = DEFAULT_CACHE_TTL;
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    timeout: usize = DEFAULT_TIMEOUT_SECS;
    verbosity: Verbosity = Verbosity::default();
}

// Macro for merging configuration values
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// novelgate fetches extension modules, extension libraries and chapters
/// from novel sites without hammering them.
///
/// Requests to the same host are spaced out and fetched artifacts are kept in
/// memory for a while, so repeated targets are only downloaded once.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct NovelgateOptions {
    /// Targets to fetch
    #[arg(
        name = "targets",
        required = true,
        long_help = "Targets to fetch, either `KEY=URL` or a bare `URL`.

For `--kind extension` and `--kind chapter`, KEY is a numeric id and a bare URL
gets its position in the list (starting at 1). For `--kind library`, KEY is
the library name and a bare URL gets its last path segment. Bare library URLs
with the same last segment share one cache entry, even on different hosts;
give them distinct names with `KEY=URL`.

Examples:

    novelgate https://novels.example.com/chapter/1 https://novels.example.com/chapter/2
    novelgate --kind library strings=https://libs.example.com/strings.js"
    )]
    raw_targets: Vec<String>,

    /// Configuration file to use
    #[arg(short, long = "config")]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,
}

impl NovelgateOptions {
    /// Parse the raw targets according to the configured artifact kind
    pub(crate) fn targets(&self) -> Result<Vec<Target>> {
        self.raw_targets
            .iter()
            .enumerate()
            .map(|(index, raw)| Target::parse(self.config.kind, index + 1, raw))
            .collect::<Result<_>>()
            .context("Cannot parse targets from arguments")
    }
}

/// Parses an artifact kind, listing the valid ones on error
#[derive(Clone, Debug)]
struct KindParser;

impl TypedValueParser for KindParser {
    type Value = ArtifactKind;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &std::ffi::OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let kind = value.to_str().ok_or_else(|| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidUtf8,
                "Artifact kind contains invalid UTF-8",
            )
        })?;
        kind.parse::<ArtifactKind>().map_err(|e| {
            clap::Error::raw(
                clap::error::ErrorKind::InvalidValue,
                format!("{e}; expected one of extension, library, chapter\n"),
            )
        })
    }
}

/// The main configuration for novelgate
#[derive(Parser, Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Verbose program output
    #[clap(flatten)]
    #[serde(default = "verbosity")]
    pub(crate) verbose: Verbosity,

    /// Kind of artifact the targets point to (extension, library, chapter)
    #[arg(long, default_value = "chapter", value_parser = KindParser)]
    #[serde(default)]
    pub(crate) kind: ArtifactKind,

    /// Fetch the whole target list this many times.
    /// Later passes are served from memory while cached entries are live.
    #[arg(long, default_value = &PASSES_STR, verbatim_doc_comment)]
    #[serde(default = "passes")]
    pub(crate) passes: usize,

    /// Minimum time between two requests to the same host, e.g. `500ms` or `2s`
    #[arg(long, value_parser = humantime::parse_duration, default_value = REQUEST_INTERVAL_STR)]
    #[serde(default = "request_interval", with = "humantime_serde")]
    pub(crate) request_interval: Duration,

    /// How long fetched artifacts stay cached
    #[arg(long, value_parser = humantime::parse_duration, default_value = CACHE_TTL_STR)]
    #[serde(default = "cache_ttl", with = "humantime_serde")]
    pub(crate) cache_ttl: Duration,

    /// Maximum number of cached extension modules
    #[arg(long, default_value = &MAX_EXTENSIONS_STR)]
    #[serde(default = "max_extensions")]
    pub(crate) max_extensions: usize,

    /// Maximum number of cached extension libraries
    #[arg(long, default_value = &MAX_LIBRARIES_STR)]
    #[serde(default = "max_libraries")]
    pub(crate) max_libraries: usize,

    /// Maximum number of cached chapters
    #[arg(long, default_value = &MAX_CHAPTERS_STR)]
    #[serde(default = "max_chapters")]
    pub(crate) max_chapters: usize,

    /// Maximum number of targets fetched at the same time
    #[arg(long, default_value = &MAX_CONCURRENCY_STR)]
    #[serde(default = "max_concurrency")]
    pub(crate) max_concurrency: usize,

    /// Maximum number of retries per target after a transient failure.
    /// Every retry waits for the host again.
    #[arg(long, default_value = &MAX_RETRIES_STR, verbatim_doc_comment)]
    #[serde(default = "max_retries")]
    pub(crate) max_retries: u64,

    /// Give up on a target if its host does not admit it within this time
    #[arg(long, value_parser = humantime::parse_duration)]
    #[serde(default, with = "humantime_serde")]
    pub(crate) max_wait: Option<Duration>,

    /// Website timeout in seconds from connect to response finished
    #[arg(short, long, default_value = &TIMEOUT_STR)]
    #[serde(default = "timeout")]
    pub(crate) timeout: usize,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Output format of the final statistics
    #[arg(short, long, default_value = "compact", value_parser = PossibleValuesParser::new(StatsFormat::VARIANTS).map(|s| s.parse::<StatsFormat>().unwrap()))]
    #[serde(default)]
    pub(crate) format: StatsFormat,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // NOTE: if you see an error within this macro call, check to make sure that
        // that the fields provided to fold_in! match all the fields of the Config struct.
        fold_in! {
            // Destination and source configs
            self, toml;

            Config {
                // Keys with defaults to assign
                cache_ttl: DEFAULT_CACHE_TTL,
                format: StatsFormat::default(),
                kind: ArtifactKind::default(),
                max_chapters: DEFAULT_MAX_CHAPTERS,
                max_concurrency: DEFAULT_MAX_CONCURRENCY,
                max_extensions: DEFAULT_MAX_EXTENSIONS,
                max_libraries: DEFAULT_MAX_LIBRARIES,
                max_retries: DEFAULT_MAX_RETRIES,
                max_wait: None,
                passes: DEFAULT_PASSES,
                request_interval: DEFAULT_REQUEST_INTERVAL,
                timeout: DEFAULT_TIMEOUT_SECS,
                user_agent: DEFAULT_USER_AGENT,
                verbose: Verbosity::default(),
            }
        }
    }

    /// Sizes and lifetime of the artifact caches
    pub(crate) const fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_extensions: self.max_extensions,
            max_libraries: self.max_libraries,
            max_chapters: self.max_chapters,
            ttl: self.cache_ttl,
        }
    }

    /// Pacing of requests per host
    pub(crate) const fn gate_config(&self) -> GateConfig {
        GateConfig {
            request_interval: self.request_interval,
        }
    }
}
