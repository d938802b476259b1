use crate::metrics::Metrics;
use crate::router::Router;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

static QUIET_NET: AtomicBool = AtomicBool::new(false);
/// Toggle routine per-request logging. Errors/warnings still log.
pub fn set_quiet_logging(quiet: bool) {
    QUIET_NET.store(quiet, Ordering::Relaxed);
}

macro_rules! net_log {
    ($($arg:tt)*) => {
        if !QUIET_NET.load(Ordering::Relaxed) {
            println!($($arg)*);
        }
    };
}

/// Accept loop: one tokio task per connection, all sharing the router (and
/// through it the single mutex-guarded ledger).
pub async fn serve(
    listener: TcpListener,
    router: Arc<Router>,
    metrics: Option<Arc<Metrics>>,
) -> Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let router = router.clone();
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Some(m) = &metrics {
                m.connections_active.inc();
            }
            handle_client(stream, addr, router, metrics.clone()).await;
            if let Some(m) = &metrics {
                m.connections_active.dec();
            }
        });
    }
}

/// Per-connection loop. Requests are newline-delimited JSON; the buffered
/// reader accumulates bytes until a full line is available, so partial and
/// coalesced reads are handled correctly. A zero-length read is a graceful
/// close; an I/O error closes only this connection.
async fn handle_client(
    stream: TcpStream,
    addr: SocketAddr,
    router: Arc<Router>,
    metrics: Option<Arc<Metrics>>,
) {
    net_log!("🤝 New connection from {}", addr);

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                net_log!("👋 Client {} disconnected", addr);
                break;
            }
            Ok(_) => {
                if line.trim().is_empty() {
                    continue;
                }
                net_log!("📨 {} -> {}", addr, line.trim());

                let response = router.handle_line(&line);
                if let Some(m) = &metrics {
                    m.requests_total.inc();
                    m.blocks_total.set(router.ledger().lock().unwrap().block_count() as i64);
                }

                let mut payload = response.to_string();
                payload.push('\n');
                if let Err(e) = write_half.write_all(payload.as_bytes()).await {
                    eprintln!("⚠️  Failed to write to {}: {}", addr, e);
                    break;
                }
                net_log!("📤 {} <- {}", addr, payload.trim_end());
            }
            Err(e) => {
                eprintln!("⚠️  Read error from {}: {}", addr, e);
                break;
            }
        }
    }

    net_log!("🔌 Connection closed with {}", addr);
}
