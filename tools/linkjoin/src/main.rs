//! Joins the datagram streams of several physical links into one
//! ordered stream and forwards it downstream.

mod config;
mod engine;
mod packet;

use clap::Parser;
use mlt_rs_log::Logger;

use config::{CmdLine, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd_line = CmdLine::parse();
    tracing_subscriber::fmt()
        .with_max_level(cmd_line.log_level.unwrap_or(tracing::Level::INFO))
        .init();

    let config = Config::load(&cmd_line)?;

    let log = Logger::new(config.verbosity);
    for token in &config.debug_tokens {
        log.accept(token);
    }

    if config.links.is_empty() {
        log.fatalx("no links configured");
    }
    if !config.capacity.is_power_of_two() {
        log.fatalx("reorder window capacity must be a power of two");
    }
    if config.stall_ms == 0 {
        log.fatalx("stall_ms must be nonzero");
    }

    engine::run(config, log).await
}
