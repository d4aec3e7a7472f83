use anyhow::{Context, Result};
use assuan_server::{config::Config, SessionContext};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(&config)?;

    let mut ctx = if config.domain() {
        SessionContext::init_domain_server(config.rendezvous_fd(), None).context("start datagram-domain server")?
    } else {
        SessionContext::init_pipe_server(0, 1).context("start pipe server")?
    };

    ctx.process().context("serve session")
}

fn init_logging(config: &Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level().as_filter()))
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("init logging")
}
