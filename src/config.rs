use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    about = env!("CARGO_PKG_DESCRIPTION"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
pub struct Config {
    ///
    /// Caster URL including the port
    ///
    /// Example: ntrip-client http://caster.example.com:2101
    ///
    pub url: String,
    ///
    /// Mountpoint to stream from (or publish to with --server). Can be
    /// given multiple times; without it the sourcetable is fetched and
    /// printed.
    ///
    #[arg(short = 'm', long = "mountpoint")]
    pub mountpoints: Vec<String>,
    ///
    /// Username for the caster
    ///
    #[arg(short = 'u', long)]
    pub user: Option<String>,
    ///
    /// Password for the caster
    ///
    #[arg(short = 'p', long = "passwd")]
    pub password: Option<String>,
    ///
    /// Act as an NTRIP server (provider): RTCM frames read from stdin
    /// are forwarded to the caster mountpoint.
    ///
    #[arg(short = 's', long)]
    pub server: bool,
    ///
    /// Use NTRIP version 1 for the server handshake
    ///
    #[arg(short = '1', long = "ntrip1")]
    pub ntrip1: bool,
    ///
    /// Log to this file in addition to stdout
    ///
    #[arg(short = 'l', long)]
    pub logfile: Option<PathBuf>,
    ///
    /// Increase verbosity: errors only by default, -v warnings,
    /// -vv info, -vvv debug.
    ///
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbosity: u8,
    ///
    /// Reconnect attempts before the backoff delay starts growing and
    /// a mountpoint that never delivered a frame is given up.
    ///
    #[arg(short = 'r', long, default_value_t = 5)]
    pub retry: u32,
}

impl Config {
    /// Load configure from command line parameters.
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        }
    }
}
