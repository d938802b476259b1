// Scenario-driving client for the MiniCoin server: sends valid deposits and
// withdrawals, overdraft and non-positive-amount rejections, and a randomized
// stress mix, then reports the final balance and integrity verdict.

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(author, version, about = "MiniCoin transaction simulator")]
struct Cli {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// Which scenario to run: all, basic, invalid, stress
    #[arg(long, default_value = "all")]
    scenario: String,
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    counter: u64,
}

impl Client {
    async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("failed to connect to {}:{}", host, port))?;
        let (read_half, writer) = stream.into_split();
        Ok(Client { reader: BufReader::new(read_half), writer, counter: 0 })
    }

    async fn request(&mut self, action: &str, amount: Option<f64>) -> Result<Value> {
        self.counter += 1;
        let mut request = json!({
            "action": action,
            "id": format!("{:04}", self.counter),
        });
        if let Some(a) = amount {
            request["amount"] = json!(a);
        }

        let mut line = request.to_string();
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;

        let mut response = String::new();
        self.reader.read_line(&mut response).await?;
        serde_json::from_str(&response).context("server sent an unparseable response")
    }
}

struct Step {
    action: &'static str,
    amount: Option<f64>,
    description: String,
}

fn step(action: &'static str, amount: Option<f64>, description: &str) -> Step {
    Step { action, amount, description: description.to_string() }
}

fn basic_scenario() -> Vec<Step> {
    vec![
        step("balance", None, "Check initial balance"),
        step("deposit", Some(50.0), "Deposit 50 MiniCoins"),
        step("withdraw", Some(30.0), "Withdraw 30 MiniCoins"),
        step("balance", None, "Check balance after transactions"),
        step("history", None, "Fetch full transaction history"),
        step("verify", None, "Verify chain integrity"),
    ]
}

fn invalid_scenario() -> Vec<Step> {
    vec![
        step("withdraw", Some(1_000_000.0), "Attempt overdraft withdrawal"),
        step("deposit", Some(-10.0), "Attempt negative deposit"),
        step("deposit", Some(0.0), "Attempt zero deposit"),
        step("withdraw", Some(-5.0), "Attempt negative withdrawal"),
        step("balance", None, "Confirm balance unchanged"),
        step("verify", None, "Verify chain integrity"),
    ]
}

fn stress_scenario() -> Vec<Step> {
    let mut rng = rand::thread_rng();
    let mut steps = Vec::new();
    for i in 0..20 {
        if rng.gen_bool(0.6) {
            let amount = rng.gen_range(1.0..50.0);
            steps.push(Step {
                action: "deposit",
                amount: Some(amount),
                description: format!("Random deposit #{}", i + 1),
            });
        } else {
            let amount = rng.gen_range(1.0..80.0);
            steps.push(Step {
                action: "withdraw",
                amount: Some(amount),
                description: format!("Random withdrawal #{}", i + 1),
            });
        }
    }
    steps.push(step("verify", None, "Verify chain integrity after stress"));
    steps
}

async fn run_scenario(cli: &Cli, name: &str, steps: Vec<Step>) -> Result<()> {
    println!("\n{}", "=".repeat(60));
    println!("Scenario: {}", name);
    println!("{}\n", "=".repeat(60));

    let mut client = Client::connect(&cli.host, cli.port).await?;

    let ping = client.request("ping", None).await?;
    if ping["message"] != "pong" {
        anyhow::bail!("unexpected ping reply: {}", ping);
    }

    let total = steps.len();
    for (i, s) in steps.into_iter().enumerate() {
        println!("[Transaction {}/{}] {}", i + 1, total, s.description);
        let response = client.request(s.action, s.amount).await?;

        let status = response["status"].as_str().unwrap_or("unknown");
        let message = response["message"].as_str().unwrap_or("");
        if status == "ok" {
            println!("  ✓ SUCCESS: {}", message);
        } else {
            println!("  ✗ REJECTED: {}", message);
        }
        if let Some(balance) = response["balance"].as_f64() {
            println!("  Balance: {:.2} MiniCoins", balance);
        }
    }

    println!("\n--- Final Status ---");
    let balance = client.request("balance", None).await?;
    println!("Final Balance: {:.2} MiniCoins", balance["balance"].as_f64().unwrap_or(0.0));
    println!("Total Blocks: {}", balance["block_count"].as_u64().unwrap_or(0));

    let verify = client.request("verify", None).await?;
    if verify["valid"].as_bool() == Some(true) {
        println!("✓ Blockchain integrity verified");
    } else {
        println!("✗ Blockchain integrity check FAILED: {}", verify["message"]);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.scenario.as_str() {
        "basic" => run_scenario(&cli, "Basic valid transactions", basic_scenario()).await?,
        "invalid" => run_scenario(&cli, "Invalid operations", invalid_scenario()).await?,
        "stress" => run_scenario(&cli, "Randomized stress", stress_scenario()).await?,
        "all" => {
            run_scenario(&cli, "Basic valid transactions", basic_scenario()).await?;
            run_scenario(&cli, "Invalid operations", invalid_scenario()).await?;
            run_scenario(&cli, "Randomized stress", stress_scenario()).await?;
        }
        other => anyhow::bail!("unknown scenario '{}' (expected all, basic, invalid, stress)", other),
    }

    Ok(())
}
