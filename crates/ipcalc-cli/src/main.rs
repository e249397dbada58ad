use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ipcalc_core::Address;
use ipcalc_net::Network;
use ipcalc_probe::{PingProbe, Probe, Sweeper, TcpProbe};

/// IPv4 address arithmetic, subnet partitioning and liveness sweeps
#[derive(Parser)]
#[command(name = "ipcalc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show network, broadcast and host range for an address + mask
    Info(InfoArgs),
    /// Partition a network into subnets of a finer mask
    Subnets(SubnetsArgs),
    /// Probe every address of a network and list the responders
    Sweep(SweepArgs),
}

#[derive(Parser)]
struct InfoArgs {
    /// Any address inside the network (e.g. 192.168.0.52)
    #[arg(value_name = "ADDR")]
    addr: String,

    /// Network mask: dotted form or bare prefix length (255.255.255.0 or 24)
    #[arg(value_name = "MASK")]
    mask: String,
}

#[derive(Parser)]
struct SubnetsArgs {
    /// Any address inside the network
    #[arg(value_name = "ADDR")]
    addr: String,

    /// Network mask: dotted form or bare prefix length
    #[arg(value_name = "MASK")]
    mask: String,

    /// Finer mask to partition by
    #[arg(value_name = "SUB_MASK")]
    sub_mask: String,
}

#[derive(Parser)]
struct SweepArgs {
    /// Any address inside the network
    #[arg(value_name = "ADDR")]
    addr: String,

    /// Network mask: dotted form or bare prefix length
    #[arg(value_name = "MASK")]
    mask: String,

    /// Number of concurrent probe workers
    #[arg(short, long, default_value = "15")]
    workers: usize,

    /// Per-probe timeout in milliseconds
    #[arg(short, long, default_value = "200")]
    timeout_ms: u64,

    /// Probe via TCP connect to this port instead of ICMP ping
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output (pretty-printed)
    Json,
    /// JSON output (compact)
    JsonCompact,
}

#[derive(Serialize)]
struct NetworkInfo {
    address: Address,
    mask: Address,
    prefix_len: u32,
    network: Address,
    broadcast: Address,
    host_count: u64,
}

#[derive(Serialize)]
struct SubnetRow {
    network: Address,
    broadcast: Address,
    host_count: u64,
}

#[derive(Serialize)]
struct SweepReport {
    network: Address,
    prefix_len: u32,
    probed: usize,
    alive: Vec<Address>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Info(args) => handle_info(args, cli.output)?,
        Commands::Subnets(args) => handle_subnets(args, cli.output)?,
        Commands::Sweep(args) => handle_sweep(args, cli.output).await?,
    }

    Ok(())
}

fn parse_network(addr: &str, mask: &str) -> Result<Network> {
    let addr = Address::parse(addr).with_context(|| format!("invalid address: {addr}"))?;
    let mask = Address::parse(mask).with_context(|| format!("invalid mask: {mask}"))?;
    Network::new(addr, mask).context("invalid network")
}

fn handle_info(args: InfoArgs, format: OutputFormat) -> Result<()> {
    let network = parse_network(&args.addr, &args.mask)?;
    let info = NetworkInfo {
        address: network.addr(),
        mask: network.mask(),
        prefix_len: network.prefix_len(),
        network: network.net_addr(),
        broadcast: network.broadcast_addr(),
        host_count: network.host_count(),
    };

    match format {
        OutputFormat::Human => {
            println!("{}  {}", "Network:".bold(), network.to_string().cyan());
            println!("{}  {}", "Mask:   ".bold(), info.mask);
            println!("{}  {}", "Net:    ".bold(), info.network);
            println!("{}  {}", "Bcast:  ".bold(), info.broadcast);
            println!("{}  {}", "Hosts:  ".bold(), info.host_count);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&info)?),
    }
    Ok(())
}

fn handle_subnets(args: SubnetsArgs, format: OutputFormat) -> Result<()> {
    let network = parse_network(&args.addr, &args.mask)?;
    let sub_mask =
        Address::parse(&args.sub_mask).with_context(|| format!("invalid mask: {}", args.sub_mask))?;
    let subnets = network.subnets(&sub_mask).context("cannot partition network")?;

    let rows: Vec<SubnetRow> = subnets
        .iter()
        .map(|s| SubnetRow {
            network: s.net_addr(),
            broadcast: s.broadcast_addr(),
            host_count: s.host_count(),
        })
        .collect();

    match format {
        OutputFormat::Human => {
            println!(
                "{} {} -> {} subnets",
                "Partition".bold(),
                network.to_string().cyan(),
                rows.len()
            );
            for (i, subnet) in subnets.iter().enumerate() {
                println!(
                    "  {:>4}  {}  ({} hosts)",
                    i,
                    subnet.to_string().cyan(),
                    subnet.host_count()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&rows)?),
    }
    Ok(())
}

async fn handle_sweep(args: SweepArgs, format: OutputFormat) -> Result<()> {
    let network = parse_network(&args.addr, &args.mask)?;
    let wait = Duration::from_millis(args.timeout_ms);
    debug!(%network, workers = args.workers, ?wait, "starting sweep");

    let mut alive = match args.port {
        Some(port) => run_sweep(TcpProbe::new(port, wait), args.workers, &network).await,
        None => run_sweep(PingProbe::new(wait), args.workers, &network).await,
    };
    // the sweep finishes in probe-completion order; report ascending
    alive.sort();

    let report = SweepReport {
        network: network.net_addr(),
        prefix_len: network.prefix_len(),
        probed: network.addresses().count(),
        alive,
    };

    match format {
        OutputFormat::Human => {
            println!(
                "{} {} ({}/{} responded)",
                "Sweep".bold(),
                network.to_string().cyan(),
                report.alive.len(),
                report.probed
            );
            for addr in &report.alive {
                println!("  {}", addr.to_string().green());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::JsonCompact => println!("{}", serde_json::to_string(&report)?),
    }
    Ok(())
}

async fn run_sweep<P: Probe>(probe: P, workers: usize, network: &Network) -> Vec<Address> {
    Sweeper::new(probe).with_workers(workers).find_all(network).await
}
