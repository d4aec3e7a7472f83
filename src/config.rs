//! Configuration for the demonstration server binary.
use clap::{Parser, ValueEnum};
use getset::CopyGetters;

#[derive(CopyGetters, Debug, Parser)]
#[command(author, version, about = "Demonstration server for a line-oriented IPC protocol", long_about = None)]
pub struct Config {
    #[get_copy = "pub"]
    #[arg(long("log-level"), short('l'), env("ASSUAN_LOG_LEVEL"), default_value = "info")]
    /// The logging verbosity of the server.
    log_level: LogLevel,

    #[get_copy = "pub"]
    #[arg(long)]
    /// Serve a fresh datagram-domain rendezvous instead of adopting stdio pipes.
    domain: bool,

    #[get_copy = "pub"]
    #[arg(long("rendezvous-fd"), default_value_t = 3)]
    /// Descriptor used for the rendezvous handshake when `--domain` is set.
    rendezvous_fd: i32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
