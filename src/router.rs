use crate::ledger::{Ledger, LedgerError};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Translates one decoded client request into one ledger call and one
/// response object. Stateless apart from the monotonic request counter.
///
/// Every ledger operation runs under a single lock acquisition, so requests
/// from concurrent connections serialize into a total order: two concurrent
/// withdrawals can never both observe the same pre-withdrawal balance.
pub struct Router {
    ledger: Arc<Mutex<Ledger>>,
    request_count: AtomicU64,
}

impl Router {
    pub fn new(ledger: Arc<Mutex<Ledger>>) -> Self {
        Router { ledger, request_count: AtomicU64::new(0) }
    }

    pub fn ledger(&self) -> &Arc<Mutex<Ledger>> {
        &self.ledger
    }

    /// Process one newline-framed request line into a response object.
    /// Domain failures and undecodable bodies come back as `status=error`
    /// responses; nothing here closes the connection.
    pub fn handle_line(&self, line: &str) -> Value {
        let request_id = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;

        let request: Value = match serde_json::from_str(line.trim()) {
            Ok(v) => v,
            Err(_) => {
                return json!({
                    "status": "error",
                    "message": "Invalid JSON format",
                    "request_id": request_id,
                    "timestamp": Utc::now().to_rfc3339(),
                });
            }
        };

        let action = request
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let client_id = client_id(&request);

        match action.as_str() {
            "deposit" => self.handle_deposit(&request, request_id, client_id),
            "withdraw" => self.handle_withdraw(&request, request_id, client_id),
            "balance" => self.handle_balance(request_id, client_id),
            "history" => self.handle_history(request_id, client_id),
            "verify" => self.handle_verify(request_id, client_id),
            "ping" => json!({
                "status": "ok",
                "message": "pong",
                "request_id": request_id,
                "client_id": client_id,
                "timestamp": Utc::now().to_rfc3339(),
            }),
            _ => json!({
                "status": "error",
                "message": format!("Unknown action: {}", action),
                "request_id": request_id,
                "client_id": client_id,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        }
    }

    fn handle_deposit(&self, request: &Value, request_id: u64, client_id: Value) -> Value {
        let amount = amount_of(request);
        let mut ledger = self.ledger.lock().unwrap();
        match ledger.deposit(amount) {
            Ok(block) => json!({
                "status": "ok",
                "message": format!("Deposit of {:.2} completed successfully", amount),
                "balance": ledger.balance(),
                "block_index": block.index,
                "block_hash": block.hash,
                "request_id": request_id,
                "client_id": client_id,
                "timestamp": Utc::now().to_rfc3339(),
            }),
            Err(e) => error_response(&ledger, e, request_id, client_id),
        }
    }

    fn handle_withdraw(&self, request: &Value, request_id: u64, client_id: Value) -> Value {
        let amount = amount_of(request);
        let mut ledger = self.ledger.lock().unwrap();
        match ledger.withdraw(amount) {
            Ok(block) => json!({
                "status": "ok",
                "message": format!("Withdrawal of {:.2} completed successfully", amount),
                "balance": ledger.balance(),
                "block_index": block.index,
                "block_hash": block.hash,
                "request_id": request_id,
                "client_id": client_id,
                "timestamp": Utc::now().to_rfc3339(),
            }),
            Err(e) => error_response(&ledger, e, request_id, client_id),
        }
    }

    fn handle_balance(&self, request_id: u64, client_id: Value) -> Value {
        let ledger = self.ledger.lock().unwrap();
        json!({
            "status": "ok",
            "balance": ledger.balance(),
            "block_count": ledger.block_count(),
            "request_id": request_id,
            "client_id": client_id,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    fn handle_history(&self, request_id: u64, client_id: Value) -> Value {
        let ledger = self.ledger.lock().unwrap();
        let history = ledger.history();
        json!({
            "status": "ok",
            "history": history,
            "block_count": history.len(),
            "request_id": request_id,
            "client_id": client_id,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    fn handle_verify(&self, request_id: u64, client_id: Value) -> Value {
        let ledger = self.ledger.lock().unwrap();
        let (valid, message) = ledger.verify_integrity();
        json!({
            "status": (if valid { "ok" } else { "error" }),
            "valid": valid,
            "message": message,
            "request_id": request_id,
            "client_id": client_id,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}

fn amount_of(request: &Value) -> f64 {
    request.get("amount").and_then(Value::as_f64).unwrap_or(0.0)
}

/// Correlation token echoed back to the caller: `client_id`, then `id`,
/// then the literal `"unknown"`.
fn client_id(request: &Value) -> Value {
    request
        .get("client_id")
        .or_else(|| request.get("id"))
        .cloned()
        .unwrap_or_else(|| Value::String("unknown".to_string()))
}

fn error_response(ledger: &Ledger, err: LedgerError, request_id: u64, client_id: Value) -> Value {
    json!({
        "status": "error",
        "message": err.to_string(),
        "balance": ledger.balance(),
        "request_id": request_id,
        "client_id": client_id,
        "timestamp": Utc::now().to_rfc3339(),
    })
}
