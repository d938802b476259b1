use anyhow::Context;
use clap::Parser;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::signal;

use minicoin::{config, ledger::Ledger, metrics, router::Router, server};

#[derive(Parser)]
#[command(author, version, about = "MiniCoin ledger server")]
struct Cli {
    /// Optional TOML config file; CLI flags override file values
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Account owner name
    #[arg(long)]
    owner: Option<String>,

    /// Initial deposit seeding the genesis block
    #[arg(long)]
    initial: Option<f64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_bind: Option<String>,

    /// Suppress routine per-request logs
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("--- MiniCoin Server ---");

    let cli = Cli::parse();
    if cli.quiet {
        server::set_quiet_logging(true);
    }

    let mut cfg = match &cli.config {
        Some(path) => config::load(path)?,
        None => config::Config::default(),
    };
    if let Some(host) = cli.host {
        cfg.net.host = host;
    }
    if let Some(port) = cli.port {
        cfg.net.port = port;
    }
    if let Some(owner) = cli.owner {
        cfg.account.owner = owner;
    }
    if let Some(initial) = cli.initial {
        cfg.account.initial_deposit = initial;
    }
    if let Some(bind) = cli.metrics_bind {
        cfg.metrics.bind = bind;
        cfg.metrics.enabled = true;
    }

    let ledger = Arc::new(Mutex::new(Ledger::new(
        cfg.account.owner.clone(),
        cfg.account.initial_deposit,
    )));
    let router = Arc::new(Router::new(ledger.clone()));

    let metrics = if cfg.metrics.enabled {
        let m = metrics::Metrics::new()?;
        m.serve(cfg.metrics.bind.clone());
        println!("📊 Metrics on http://{}", cfg.metrics.bind);
        Some(m)
    } else {
        None
    };

    let listener = TcpListener::bind((cfg.net.host.as_str(), cfg.net.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.net.host, cfg.net.port))?;
    let addr = listener.local_addr()?;

    {
        let ledger = ledger.lock().unwrap();
        println!("{}", "=".repeat(60));
        println!("📡 Listening on {}", addr);
        println!("🏦 Owner: {}", ledger.owner());
        println!("💰 Initial balance: {:.2} MiniCoins", ledger.balance());
        println!("🧱 Genesis block hash: {}", ledger.last_block().hash);
        println!("{}", "=".repeat(60));
    }

    tokio::select! {
        res = server::serve(listener, router, metrics) => res,
        _ = signal::ctrl_c() => {
            println!("\n🛑 Server stopped by user");
            Ok(())
        }
    }
}
