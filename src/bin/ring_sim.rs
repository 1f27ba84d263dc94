// bin/ring_sim.rs - Key Ring Simulation Binary

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wot_keyring::{
    KeyExchangeMessage, KeyRecord, KeyRing, Keypair, StaticReputation, TrustedKeyRecord,
};

/// Simulated gossip cohort exchanging key attestations through one ring
#[derive(Parser, Debug)]
#[command(name = "ring-sim")]
#[command(version)]
#[command(about = "Web-of-trust key ring simulation", long_about = None)]
struct Args {
    /// Number of simulated peers besides the local one (minimum 2)
    #[arg(short, long, default_value = "8")]
    peers: usize,

    /// Attestation rounds to gossip
    #[arg(short, long, default_value = "24")]
    rounds: usize,

    /// Updater tick in milliseconds
    #[arg(long, default_value = "200")]
    tick_ms: u64,

    /// Confidence threshold below which keys are withheld
    #[arg(short, long, default_value = "0.5")]
    threshold: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write the final ring snapshot to this JSON file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},wot_keyring={}", args.log_level, args.log_level))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let peers = args.peers.max(2);
    info!(peers, rounds = args.rounds, threshold = args.threshold, "starting simulation");

    let local = Keypair::generate();
    let names: Vec<String> = (0..peers).map(|i| format!("peer-{i}")).collect();
    let keys: Vec<Keypair> = (0..peers).map(|_| Keypair::generate()).collect();

    // the first two peers are trusted out of band
    let bootstrap: Vec<TrustedKeyRecord> = names
        .iter()
        .zip(&keys)
        .take(2)
        .map(|(name, key)| TrustedKeyRecord::new(KeyRecord::new(name.clone(), key.public()), 1.0))
        .collect();

    let ring = KeyRing::new("local", local.public(), bootstrap, args.threshold);

    let mut rng = rand::rng();
    let oracle: StaticReputation = names
        .iter()
        .map(|name| (name.clone(), rng.random_range(0.2..1.0)))
        .collect();

    let tick = Duration::from_millis(args.tick_ms);
    ring.start_with_reputation(tick, Arc::new(oracle));

    // gossip random attestations; the ring verifies them as signers
    // become trusted
    for round in 0..args.rounds {
        let s = rng.random_range(0..peers);
        let mut t = rng.random_range(0..peers);
        if t == s {
            t = (t + 1) % peers;
        }

        let msg = KeyExchangeMessage::create(&keys[s], &names[s], &names[t], &keys[t].public());
        ring.add_unverified(msg);

        if round % 4 == 0 {
            tokio::time::sleep(tick / 2).await;
        }
    }

    // let the updater settle the queue
    tokio::time::sleep(tick * 4).await;
    ring.stop();

    let stats = ring.stats();
    let trusted = ring
        .peer_list()
        .into_iter()
        .filter(|name| ring.get_key(name).is_some())
        .count();
    info!(
        nodes = stats.nodes,
        edges = stats.edges,
        records = stats.records,
        pending = stats.pending,
        trusted,
        "simulation finished"
    );

    let snapshot = ring.snapshot();
    match &args.out {
        Some(path) => {
            std::fs::write(path, serde_json::to_vec_pretty(&snapshot)?)?;
            info!(path = ?path, "snapshot written");
        }
        None => println!("{}", serde_json::to_string_pretty(&snapshot)?),
    }

    Ok(())
}
