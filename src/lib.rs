// Library interface for the MiniCoin ledger server
// This allows tests and external consumers to drive the ledger and server directly

pub mod config;
pub mod ledger;
pub mod metrics;
pub mod router;
pub mod server;

pub use ledger::{calculate_hash, verify_blocks, Block, Ledger, LedgerError, Op};
pub use router::Router;
