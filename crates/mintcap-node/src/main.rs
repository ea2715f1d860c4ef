//! mintcap-node: single-process host for the Mintcap supply ledger.
//!
//! Startup sequence:
//!   1. Open the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the main loop: apply queued calls one at a time, reply to the caller

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use mintcap_core::constants::{INITIAL_SUPPLY, MAX_ANNUAL_MINT, TOKEN_SYMBOL};
use mintcap_rpc::{CallRequest, RpcServer, RpcServerState};
use mintcap_state::{open_or_genesis, Capabilities, GenesisParams, StateDb, SystemClock};

#[derive(Parser, Debug)]
#[command(
    name = "mintcap-node",
    version,
    about = "Mintcap node: a fixed-genesis token ledger with an annual mint cap"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.mintcap/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only required on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Capacity of the inbound call queue.
    #[arg(long, default_value_t = 512)]
    queue_depth: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mintcap=debug".into()),
        )
        .init();

    let args = Args::parse();
    info!(symbol = TOKEN_SYMBOL, "Mintcap node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    let params = load_genesis_params(args.genesis_params.as_deref())?;
    let caps = Capabilities::from_db(&db, Arc::new(SystemClock));
    let controller = Arc::new(
        open_or_genesis(Arc::clone(&db), caps, params.as_ref())
            .context("opening ledger (pass --genesis-params on first run)")?,
    );
    info!(
        admin = %controller.admin(),
        initial_supply = %INITIAL_SUPPLY,
        max_annual_mint = %MAX_ANNUAL_MINT,
        year = controller.current_year(),
        "ledger ready"
    );

    // ── Inbound call queue ────────────────────────────────────────────────────
    let (call_sender, mut call_receiver) = mpsc::channel::<CallRequest>(args.queue_depth.max(1));

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        controller: Arc::clone(&controller),
        call_sender: Some(call_sender),
    });
    let (rpc_addr, rpc_handle) = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Main loop: apply & reply ──────────────────────────────────────────────
    info!(rpc = %rpc_addr, "node ready");
    loop {
        tokio::select! {
            req = call_receiver.recv() => {
                let Some(CallRequest { envelope, reply }) = req else { break };
                let result = controller.apply(&envelope);
                match &result {
                    Ok(Some(record)) => debug!(seq = record.seq, event = record.event.name(), "call applied"),
                    Ok(None) => debug!(call = envelope.call.name(), "call applied, no change"),
                    Err(e) => warn!(call = envelope.call.name(), caller = %envelope.caller, error = %e, "call rejected"),
                }
                // The RPC side may have given up waiting; the outcome is already durable.
                let _ = reply.send(result);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    let _ = rpc_handle.stop();
    db.flush().context("flushing state database")?;
    info!("node stopped");
    Ok(())
}

/// Load genesis parameters from a JSON file, if a path was given.
fn load_genesis_params(path: Option<&Path>) -> anyhow::Result<Option<GenesisParams>> {
    let Some(p) = path else {
        return Ok(None);
    };
    let json = std::fs::read_to_string(p)
        .with_context(|| format!("reading genesis params from {}", p.display()))?;
    let params = serde_json::from_str(&json).context("parsing genesis params JSON")?;
    Ok(Some(params))
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
