use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub net: Net,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub metrics: Metrics,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Net {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Account {
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_initial")]
    pub initial_deposit: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Metrics {
    #[serde(default = "default_metrics_bind")]
    pub bind: String,
    #[serde(default)]
    pub enabled: bool,
}

impl Default for Net {
    fn default() -> Self {
        Net { host: default_host(), port: default_port() }
    }
}

impl Default for Account {
    fn default() -> Self {
        Account { owner: default_owner(), initial_deposit: default_initial() }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics { bind: default_metrics_bind(), enabled: false }
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 8888 }
fn default_owner() -> String { "MiniCoin Account".into() }
fn default_initial() -> f64 { 100.0 }
fn default_metrics_bind() -> String { "127.0.0.1:9100".into() }

/// Read the TOML file at `p` and deserialize into `Config`.
/// Adds context so user errors print a friendlier message.
pub fn load<P: AsRef<Path>>(p: P) -> Result<Config> {
    let text = fs::read_to_string(&p)
        .with_context(|| format!("🗂️  couldn't read config file {}", p.as_ref().display()))?;
    load_from_str(&text)
}

pub fn load_from_str(text: &str) -> Result<Config> {
    toml::from_str(text).with_context(|| "📝  invalid TOML in config file".to_string())
}
