//! harness: performance experiments for MK-CKKS secure aggregation.
//!
//! Runs full aggregation rounds, checks the decoded sum against the
//! plaintext sum and appends raw measurements to three CSV logs.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use mk_ckks_secagg::protocol::{RoundConfig, RoundReport, millis, run_round};

const CLIENT_COUNTS: [usize; 5] = [10, 50, 100, 200, 350];
const FIXED_DATA_SIZE_FOR_EXP1: usize = 65536;

const FIXED_CLIENT_COUNT_FOR_EXP2: usize = 500;
const DATA_SIZES: [usize; 6] = [4095, 8192, 16384, 32768, 50000, 65536];

/// Largest acceptable per-slot deviation from the plaintext sum.
const TOLERANCE: f64 = 1.0;

const CLIENT_LOG_HEADER: &str = "Experiment,NumClients,DataSize,RingDimension,ClientID,T_KeyGen_MKCKKS_ms,T_KeyGen_ECDH_ms,T_KeyGen_Total_ms,T_Encrypt_ms,T_MaskGen_ms,T_ClientTotal_ms";
const SERVER_LOG_HEADER: &str =
    "Experiment,NumClients,DataSize,RingDimension,T_Aggregate_ms,T_Decode_ms,T_ServerTotal_ms";
const COMM_LOG_HEADER: &str = "Experiment,NumClients,DataSize,RingDimension,PlaintextBytes,CiphertextBytes,ClientUplinkBytes,SetupBytes,FinalDownlinkBytes,CiphertextExpansion,CommExpansion";

#[derive(Parser, Debug)]
#[command(name = "harness")]
#[command(about = "Secure aggregation experiments over MK-CKKS with pairwise masking")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Directory for the CSV logs
    #[arg(long, default_value = "log_files")]
    log_dir: PathBuf,

    /// Seed for every random choice (fresh OS randomness when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Prepare client shares on all cores
    #[arg(long)]
    parallel: bool,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scale the number of clients, then the data size
    Experiments {
        /// Run only experiment 1 or 2
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
        only: Option<u8>,
    },
    /// Run a single round
    Single {
        #[arg(long, short = 'n', default_value_t = 10)]
        clients: usize,

        #[arg(long, short = 'd', default_value_t = 1024)]
        data_size: usize,
    },
}

struct Logs {
    client: BufWriter<File>,
    server: BufWriter<File>,
    comm: BufWriter<File>,
}

fn create_log(dir: &Path, name: &str, header: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}")?;
    Ok(writer)
}

impl Logs {
    fn create(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        Ok(Self {
            client: create_log(dir, "log_computation_client.csv", CLIENT_LOG_HEADER)?,
            server: create_log(dir, "log_computation_server.csv", SERVER_LOG_HEADER)?,
            comm: create_log(dir, "log_communication_analysis.csv", COMM_LOG_HEADER)?,
        })
    }

    fn record(&mut self, experiment: &str, report: &RoundReport) -> Result<()> {
        let num_clients = report.clients.len();
        let prefix = format!(
            "{experiment},{num_clients},{},{}",
            report.data_length, report.ring_dim
        );

        for client in &report.clients {
            let t = &client.timings;
            writeln!(
                self.client,
                "{prefix},{},{},{},{},{},{},{}",
                client.client_id,
                millis(t.keygen.mkckks),
                millis(t.keygen.ecdh),
                millis(t.keygen.total),
                millis(t.encrypt),
                millis(t.mask_gen),
                millis(t.total),
            )?;
        }

        let s = &report.server;
        writeln!(
            self.server,
            "{prefix},{},{},{}",
            millis(s.aggregate),
            millis(s.decode),
            millis(s.total)
        )?;

        let c = &report.communication;
        writeln!(
            self.comm,
            "{prefix},{},{},{},{},{},{},{}",
            c.plaintext_bytes,
            c.ciphertext_bytes,
            c.client_uplink_bytes,
            c.setup_bytes,
            c.final_downlink_bytes,
            c.ciphertext_expansion(),
            c.comm_expansion(),
        )?;

        self.client.flush()?;
        self.server.flush()?;
        self.comm.flush()?;
        Ok(())
    }
}

fn run_experiment(
    logs: &mut Logs,
    args: &Args,
    experiment: &str,
    num_clients: usize,
    data_size: usize,
) -> Result<()> {
    info!(experiment, num_clients, data_size, "starting round");
    let mut config = RoundConfig::new(num_clients, data_size).with_parallel(args.parallel);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let report = run_round(&config).with_context(|| {
        format!("{experiment} round with {num_clients} clients and {data_size} values failed")
    })?;
    logs.record(experiment, &report)?;
    print_summary(&report);

    if report.max_abs_error >= TOLERANCE {
        warn!(
            max_abs_error = report.max_abs_error,
            "decoded sum deviates from the plaintext sum"
        );
    }
    Ok(())
}

fn print_summary(report: &RoundReport) {
    let c = &report.communication;
    println!(
        "--- N={}, d={}, N_poly={} ---",
        report.clients.len(),
        report.data_length,
        report.ring_dim
    );
    if let Some(last) = report.clients.last() {
        println!("  Computation Summary (Last Client):");
        println!("    - T_Encrypt: {:.3} ms", millis(last.timings.encrypt));
        println!("    - T_MaskGen: {:.3} ms", millis(last.timings.mask_gen));
    }
    println!(
        "    - T_Server: {:.3} ms (aggregate {:.3}, decode {:.3})",
        millis(report.server.total),
        millis(report.server.aggregate),
        millis(report.server.decode)
    );
    println!("  Communication Cost Summary:");
    println!(
        "    - Client Uplink Share Size: {:.2} KB",
        c.client_uplink_bytes as f64 / 1024.0
    );
    println!(
        "    - Ciphertext Expansion Factor: {:.2}x",
        c.ciphertext_expansion()
    );
    println!(
        "    - Communication Expansion Factor: {:.2}x",
        c.comm_expansion()
    );
    println!("  Max |decoded - expected|: {:.3e}", report.max_abs_error);
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut logs = Logs::create(&args.log_dir)?;

    match &args.command {
        Commands::Experiments { only } => {
            if only.is_none_or(|n| n == 1) {
                info!(
                    data_size = FIXED_DATA_SIZE_FOR_EXP1,
                    "experiment 1: scaling number of clients"
                );
                for num_clients in CLIENT_COUNTS {
                    run_experiment(
                        &mut logs,
                        &args,
                        "ScalingClients",
                        num_clients,
                        FIXED_DATA_SIZE_FOR_EXP1,
                    )?;
                }
            }
            if only.is_none_or(|n| n == 2) {
                info!(
                    num_clients = FIXED_CLIENT_COUNT_FOR_EXP2,
                    "experiment 2: scaling data size"
                );
                for data_size in DATA_SIZES {
                    run_experiment(
                        &mut logs,
                        &args,
                        "ScalingDataSize",
                        FIXED_CLIENT_COUNT_FOR_EXP2,
                        data_size,
                    )?;
                }
            }
        }
        Commands::Single { clients, data_size } => {
            run_experiment(&mut logs, &args, "Single", *clients, *data_size)?;
        }
    }

    info!(log_dir = %args.log_dir.display(), "all runs finished");
    Ok(())
}
