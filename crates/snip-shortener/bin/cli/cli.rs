use clap::{Parser, Subcommand, ValueEnum};
use snip_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "SNIP_DATA_DIR";
pub const BASE_URL_ENV: &str = "SNIP_BASE_URL";
pub const LOG_ENDPOINT_ENV: &str = "SNIP_LOG_ENDPOINT";
pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = ".snip";
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Pretty => write!(f, "pretty"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip", about = "Shorten URLs and track their clicks")]
pub struct CLI {
    #[arg(long, env = DATA_DIR_ENV, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    #[arg(long, env = BASE_URL_ENV, default_value = snip_shortener::settings::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Remote log collector; remote logging is off when unset.
    #[arg(long, env = LOG_ENDPOINT_ENV)]
    pub log_endpoint: Option<String>,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten up to five URLs at once.
    ///
    /// The n-th `--validity` and `--code` apply to the n-th `--url`.
    Shorten {
        #[arg(long = "url", required = true)]
        urls: Vec<String>,

        #[arg(long = "validity")]
        validities: Vec<i64>,

        #[arg(long = "code")]
        codes: Vec<String>,
    },
    /// List every link, newest first.
    List,
    /// Delete a link and its clicks.
    Delete { id: String },
    /// Record a simulated click.
    Click { id: String },
    /// Resolve a short code and count the visit.
    Follow { code: String },
    /// Show the statistics summary.
    Stats,
}
