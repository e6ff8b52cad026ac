use std::fs;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(clap::Parser)]
pub struct CmdLine {
    #[clap(short, long)]
    pub config: String,

    #[clap(long, short, rename_all = "lowercase")]
    pub log_level: Option<tracing::Level>,
}

fn default_capacity() -> usize {
    64
}

fn default_drain_budget() -> usize {
    32
}

fn default_stall_ms() -> u64 {
    50
}

fn default_verbosity() -> u8 {
    2
}

/// One physical link we receive the tunnel stream over.
#[derive(Debug, Deserialize)]
pub struct LinkConfig {
    pub listen: SocketAddr,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// slots in the reorder window; must be a power of two and larger
    /// than the deepest reordering the link set produces
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// packets forwarded per drain pass
    #[serde(default = "default_drain_budget")]
    pub drain_budget: usize,

    /// how long the head gap may stall before a forced drain
    #[serde(default = "default_stall_ms")]
    pub stall_ms: u64,

    /// verbosity of the tunnel log sink (not the tracing output)
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,

    /// debug tokens accepted by the tunnel log sink
    #[serde(default)]
    pub debug_tokens: Vec<String>,

    pub links: Vec<LinkConfig>,

    /// where the ordered stream goes
    pub forward: SocketAddr,
}

impl Config {
    pub fn load(cmd_line: &CmdLine) -> Result<Self> {
        toml::from_str(&fs::read_to_string(&cmd_line.config).with_context(|| {
            format!("failed to read config file from: {}", cmd_line.config)
        })?)
        .with_context(|| format!("failed to parse config file from: {}", cmd_line.config))
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn parse_minimal() {
        let config: Config = toml::from_str(
            r#"
            forward = "127.0.0.1:9000"

            [[links]]
            listen = "0.0.0.0:7001"

            [[links]]
            listen = "0.0.0.0:7002"
            "#,
        )
        .unwrap();
        assert_eq!(config.links.len(), 2);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.drain_budget, 32);
        assert_eq!(config.stall_ms, 50);
        assert!(config.debug_tokens.is_empty());
    }

    #[test]
    fn parse_full() {
        let config: Config = toml::from_str(
            r#"
            capacity = 128
            drain_budget = 16
            stall_ms = 20
            verbosity = 2
            debug_tokens = ["reorder"]
            forward = "10.0.0.1:9000"

            [[links]]
            listen = "0.0.0.0:7001"
            "#,
        )
        .unwrap();
        assert_eq!(config.capacity, 128);
        assert_eq!(config.debug_tokens, ["reorder"]);
    }
}
