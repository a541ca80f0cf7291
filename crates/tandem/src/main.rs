//! tandem - replicate a text document between two peers

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tandem::config::{DEFAULT_OPLOG_PATH, DEFAULT_PORT};
use tandem::{Inbound, Replica, ReplicaConfig, Role, TransportConfig};

const PING_INTERVAL: Duration = Duration::from_secs(1);
const STATUS_INTERVAL: Duration = Duration::from_secs(1);
const RECV_POLL: Duration = Duration::from_millis(50);

#[derive(Parser)]
#[command(
    name = "tandem",
    version,
    about = "Replicate a text document between a writer and a reader",
    arg_required_else_help = true
)]
struct Cli {
    /// Role of this peer (writer or reader)
    #[arg(long)]
    role: Role,

    /// Host of the other peer
    #[arg(long)]
    host: String,

    /// Port of the other peer
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Port to accept connections on (0 disables)
    #[arg(long, default_value_t = DEFAULT_PORT)]
    listen: u16,

    /// Oplog file
    #[arg(long, default_value = DEFAULT_OPLOG_PATH)]
    oplog: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ReplicaConfig::new(cli.role)
        .with_oplog_path(&cli.oplog)
        .with_transport(TransportConfig::from_parts(cli.listen, &cli.host, cli.port));

    let replica = Replica::open(config)
        .with_context(|| format!("failed to open oplog {}", cli.oplog.display()))?;
    let replica = Arc::new(replica);
    replica.start().await.context("failed to start transport")?;
    info!(
        role = %cli.role,
        peer = %format!("{}:{}", cli.host, cli.port),
        listen = cli.listen,
        "tandem started"
    );

    let pinger = tokio::spawn(ping_loop(Arc::clone(&replica)));
    let editor = (cli.role == Role::Writer).then(|| tokio::spawn(stdin_loop(Arc::clone(&replica))));

    let outcome = run(&replica).await;

    pinger.abort();
    if let Some(editor) = editor {
        editor.abort();
    }
    replica.stop().await;

    let doc = replica.snapshot().await;
    info!(ops = doc.last_seq(), bytes = doc.len(), checksum = %doc.checksum(), "tandem stopped");
    outcome
}

/// Handle received frames until ctrl-c or divergence.
async fn run(replica: &Replica) -> Result<()> {
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut status = tokio::time::interval(STATUS_INTERVAL);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("interrupted, shutting down");
                return Ok(());
            }
            _ = status.tick() => {
                let doc = replica.snapshot().await;
                println!(
                    "[status] connected={} seq={} bytes={} checksum={}",
                    if replica.is_connected() { "yes" } else { "no" },
                    doc.last_seq(),
                    doc.len(),
                    doc.checksum(),
                );
            }
            frame = replica.transport().recv_frame(RECV_POLL) => {
                let Some(frame) = frame else { continue };
                match replica.handle_frame(frame).await {
                    Ok(inbound) => report(&inbound),
                    Err(e) if e.is_fatal() => {
                        error!(error = %e, "stopping");
                        return Err(e.into());
                    }
                    Err(e) => warn!(error = %e, "bad frame"),
                }
            }
        }
    }
}

fn report(inbound: &Inbound) {
    match inbound {
        Inbound::Applied(op) => println!(
            "[recv] OP #{} {} @{} -> {}",
            op.seq, op.kind, op.pos, op.checksum
        ),
        Inbound::Hello(role) => println!("[recv] HELLO: {role}"),
        Inbound::Ack(payload) => println!("[recv] ACK: {}", String::from_utf8_lossy(payload)),
        Inbound::Ping => println!("[recv] PING -> replying with PONG"),
        Inbound::Pong => println!("[recv] PONG"),
        Inbound::Ignored(kind) => println!("[recv] unknown type={kind}"),
    }
}

/// Greet each new connection, then ping once a second while connected.
async fn ping_loop(replica: Arc<Replica>) {
    let mut ticker = tokio::time::interval(PING_INTERVAL);
    let mut was_connected = false;
    loop {
        ticker.tick().await;
        let connected = replica.is_connected();
        if connected && !was_connected {
            replica.greet().await;
        }
        if connected {
            replica.ping().await;
        }
        was_connected = connected;
    }
}

/// Append each stdin line to the end of the document.
async fn stdin_loop(replica: Arc<Replica>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let text = format!("{line}\n");
                match replica.append(text.as_bytes()).await {
                    Ok(op) => println!("[edit] INSERT #{} @{} -> {}", op.seq, op.pos, op.checksum),
                    Err(e) => warn!(error = %e, "edit rejected"),
                }
            }
            Ok(None) => {
                info!("stdin closed, no more edits");
                return;
            }
            Err(e) => {
                warn!(error = %e, "failed to read stdin");
                return;
            }
        }
    }
}
