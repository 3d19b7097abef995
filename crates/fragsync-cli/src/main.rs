//! Fragsync CLI
//!
//! Command-line driver for the fragsync asemantic fragment validation
//! protocol: provision a domain/seed pair, emit fragments from a
//! persisted sender snapshot, and validate/commit them against a
//! persisted receiver state.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fragsync_core::types::{DomainTag, EvolutionMode, ProvisioningConfig};
use fragsync_receiver::{ReceiverState, TraversalPolicy, ValidationOutcome, Validator};
use fragsync_sender::{BuilderSnapshot, FragmentBuilder};
use fragsync_storage::BlobStore;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fragsync")]
#[command(author = "Fragsync Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Asemantic fragment validation protocol, command-line driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug logging (set RUST_LOG for finer control)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full provision -> emit -> validate -> replay walkthrough
    /// entirely in memory, with no durable state.
    Demo,

    /// Generate a fresh domain tag and Mode A seed and write a
    /// provisioning file.
    Provision {
        /// Output path for the provisioning config (TOML).
        #[arg(short, long, default_value = "provisioning.toml")]
        out: PathBuf,

        /// Output path for the generated seed, hex-encoded.
        #[arg(short, long, default_value = "seed.hex")]
        seed_out: PathBuf,

        /// Fragment length in bits.
        #[arg(long, default_value = "256")]
        fragment_bits: u32,

        /// Window width nu.
        #[arg(long, default_value = "7")]
        window: u32,
    },

    /// Build the next fragment from a persisted sender snapshot,
    /// advancing the snapshot afterward.
    Emit {
        /// Provisioning config produced by `provision`.
        #[arg(short, long)]
        provisioning: PathBuf,

        /// Sender snapshot file; created fresh on first call.
        #[arg(short, long, default_value = "sender.snapshot.json")]
        snapshot: PathBuf,

        /// Seed file (hex), only read when the snapshot does not yet exist.
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Application content to bind the fragment to.
        #[arg(short, long)]
        content: String,
    },

    /// Validate a received fragment against persisted receiver state,
    /// committing the receiver forward on accept.
    Validate {
        /// Provisioning config, must match the sender's.
        #[arg(short, long)]
        provisioning: PathBuf,

        /// Durable receiver state blob; created fresh on first call.
        #[arg(short, long, default_value = "receiver.state.json")]
        state: PathBuf,

        /// Seed file (hex), only read when the receiver state does not
        /// yet exist on disk.
        #[arg(long)]
        seed: Option<PathBuf>,

        /// Received fragment, hex-encoded.
        #[arg(short, long)]
        fragment: String,

        /// Application content the fragment should match.
        #[arg(short, long)]
        content: String,

        /// Traversal policy: early-stop or constant-time.
        #[arg(long, default_value = "early-stop", value_parser = ["early-stop", "constant-time"])]
        policy: String,
    },

    /// Print the current anchor/rollback counter of a persisted
    /// receiver state, without validating anything.
    Status {
        /// Durable receiver state blob.
        #[arg(short, long, default_value = "receiver.state.json")]
        state: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false),
        )
        .init();
}

fn truncated_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    if full.len() <= 32 {
        full
    } else {
        format!("{}...{}", &full[..16], &full[full.len() - 16..])
    }
}

fn load_provisioning(path: &PathBuf) -> anyhow::Result<ProvisioningConfig> {
    let raw = fs::read_to_string(path)?;
    Ok(toml::from_str(&raw)?)
}

fn read_seed_hex(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    let raw = fs::read_to_string(path)?;
    Ok(hex::decode(raw.trim())?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Provision {
            out,
            seed_out,
            fragment_bits,
            window,
        } => run_provision(out, seed_out, fragment_bits, window),
        Commands::Emit {
            provisioning,
            snapshot,
            seed,
            content,
        } => run_emit(provisioning, snapshot, seed, content),
        Commands::Validate {
            provisioning,
            state,
            seed,
            fragment,
            content,
            policy,
        } => run_validate(provisioning, state, seed, fragment, content, policy),
        Commands::Status { state } => run_status(state),
    }
}

fn run_demo() -> anyhow::Result<()> {
    let mut domain_bytes = vec![0u8; 16];
    OsRng.fill_bytes(&mut domain_bytes);
    let mut seed_bytes = vec![0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    let domain = DomainTag::new(domain_bytes)?;

    println!("=== Provisioning ===");
    println!("Domain tag (hex, truncated): {}", truncated_hex(domain.as_bytes()));
    println!("Seed K0 (hex, truncated):    {}", truncated_hex(&seed_bytes));

    let mut builder = FragmentBuilder::mode_a(domain.clone(), seed_bytes.clone(), 256, 0)?;
    let mut state = ReceiverState::mode_a(domain, seed_bytes, 0)?;
    let validator = Validator::new(256, 7, TraversalPolicy::EarlyStop)?;

    let content = b"ALARM_LEVEL_3";
    println!("\nApplication content S: {:?}", content);

    println!("\n=== Emit F0 ===");
    let fragment0 = builder.build(content, false)?;
    println!("F0 (hex, truncated): {}", truncated_hex(&fragment0));

    println!("\n=== Receive F0 ===");
    println!("Before validation: anchor t = {}", state.anchor());
    let outcome0 = validator.validate_and_commit(&fragment0, &mut state, content, false);
    print_outcome("F0", &outcome0);
    println!("After validation: anchor t = {}", state.anchor());

    builder.advance();

    println!("\n=== Emit F1 ===");
    let fragment1 = builder.build(content, false)?;
    println!("F1 (hex, truncated): {}", truncated_hex(&fragment1));

    println!("\n=== Receive F1 ===");
    println!("Before validation: anchor t = {}", state.anchor());
    let outcome1 = validator.validate_and_commit(&fragment1, &mut state, content, false);
    print_outcome("F1", &outcome1);
    println!("After validation: anchor t = {}", state.anchor());

    println!("\n=== Replay of F0 (replay attack) ===");
    println!("F0 (replayed) hex truncated: {}", truncated_hex(&fragment0));
    let replay = validator.validate(&fragment0, &state, content, false);
    print_outcome("F0 replayed", &replay);
    println!("Anchor t remains = {} (no slippage)", state.anchor());

    Ok(())
}

fn print_outcome(label: &str, outcome: &ValidationOutcome) {
    match outcome {
        ValidationOutcome::Accept(j) => println!("Result for {label}: ACCEPT at index j* = {j}"),
        ValidationOutcome::Reject => println!("Result for {label}: REJECT"),
        ValidationOutcome::Error(e) => println!("Result for {label}: ERROR ({e})"),
    }
}

fn run_provision(out: PathBuf, seed_out: PathBuf, fragment_bits: u32, window: u32) -> anyhow::Result<()> {
    let mut domain_bytes = vec![0u8; 16];
    OsRng.fill_bytes(&mut domain_bytes);
    let mut seed_bytes = vec![0u8; 32];
    OsRng.fill_bytes(&mut seed_bytes);
    let domain = DomainTag::new(domain_bytes)?;

    let config = ProvisioningConfig {
        domain: domain.to_hex(),
        mode: EvolutionMode::A,
        fragment_bits,
        window,
        initial_anchor: 0,
    };

    fs::write(&out, toml::to_string_pretty(&config)?)?;
    fs::write(&seed_out, hex::encode(&seed_bytes))?;

    tracing::info!(domain = %domain.to_hex(), "provisioned a fresh domain/seed pair");
    println!("Provisioning written to {:?}", out);
    println!("Seed written to {:?} (keep this secret)", seed_out);
    Ok(())
}

fn run_emit(provisioning: PathBuf, snapshot: PathBuf, seed: Option<PathBuf>, content: String) -> anyhow::Result<()> {
    let prov = load_provisioning(&provisioning)?;

    let mut builder = if snapshot.exists() {
        let raw = fs::read(&snapshot)?;
        let snap = BuilderSnapshot::from_bytes(&raw)?;
        match prov.mode {
            EvolutionMode::A => FragmentBuilder::restore_mode_a(&snap)?,
            EvolutionMode::B => anyhow::bail!("Mode B requires an evolution function, not supported by this CLI"),
        }
    } else {
        let domain = prov.domain_tag()?;
        match prov.mode {
            EvolutionMode::A => {
                let seed_path = seed.ok_or_else(|| anyhow::anyhow!("--seed is required on first emit for Mode A"))?;
                let seed_bytes = read_seed_hex(&seed_path)?;
                FragmentBuilder::mode_a(domain, seed_bytes, prov.fragment_bits, 0)?
            }
            EvolutionMode::B => anyhow::bail!("Mode B requires an evolution function, not supported by this CLI"),
        }
    };

    let fragment = builder.build(content.as_bytes(), false)?;
    println!("index: {}", builder.current_index());
    println!("fragment: {}", hex::encode(&fragment));

    builder.advance();
    fs::write(&snapshot, builder.snapshot().to_bytes()?)?;
    Ok(())
}

fn run_validate(
    provisioning: PathBuf,
    state: PathBuf,
    seed: Option<PathBuf>,
    fragment: String,
    content: String,
    policy: String,
) -> anyhow::Result<()> {
    let prov = load_provisioning(&provisioning)?;
    let fragment_bytes = hex::decode(fragment.trim())?;

    let mut receiver = match prov.mode {
        EvolutionMode::A => {
            let seed_bytes = match seed {
                Some(path) => read_seed_hex(&path)?,
                None if state.exists() => Vec::new(),
                None => anyhow::bail!("--seed is required on first validate for Mode A"),
            };
            ReceiverState::load_or_init_mode_a(&state, &prov, seed_bytes)?
        }
        EvolutionMode::B => anyhow::bail!("Mode B requires an evolution function, not supported by this CLI"),
    };

    let traversal = match policy.as_str() {
        "constant-time" => TraversalPolicy::ConstantTime,
        _ => TraversalPolicy::EarlyStop,
    };
    let validator = Validator::new(prov.fragment_bits, prov.window, traversal)?;

    let outcome = validator.validate_and_commit(&fragment_bytes, &mut receiver, content.as_bytes(), false);
    match outcome {
        ValidationOutcome::Accept(j) => {
            println!("ACCEPT at index j* = {j}");
            Ok(())
        }
        ValidationOutcome::Reject => {
            println!("REJECT");
            std::process::exit(1);
        }
        ValidationOutcome::Error(e) => {
            eprintln!("ERROR: {e}");
            eprintln!("Receiver halted; resynchronize manually before retrying.");
            std::process::exit(2);
        }
    }
}

fn run_status(state: PathBuf) -> anyhow::Result<()> {
    let store = BlobStore::new(&state);
    match store.load()? {
        None => println!("No persisted receiver state at {:?}", state),
        Some(blob) => {
            println!("mode:             {}", blob.mode);
            println!("anchor:           {}", blob.anchor);
            println!("rollback_counter: {}", blob.rollback_counter);
        }
    }
    Ok(())
}
