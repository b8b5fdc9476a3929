//! Groupsync CLI - declarative AWS IAM group membership management
//!
//! The binary wires the SDK-backed IAM client into the reconciler and drives
//! the resource lifecycle from a local state file, the way a declarative
//! config engine would: `apply` converges live state to a desired record,
//! `destroy` removes it, `import` adopts an existing group, and `show`
//! prints the live membership without touching anything.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use groupsync::iam::SdkIamClient;
use groupsync::reconciler::Reconciler;
use groupsync::resource::GroupMembership;

/// Groupsync - declarative reconciler for AWS IAM group membership
#[derive(Parser, Debug)]
#[command(name = "groupsync", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Converge a group's membership to the desired record
    ///
    /// Reads the desired record from a YAML file. With no prior state this
    /// creates the resource; with prior state it issues only the delta
    /// between the recorded and desired user sets.
    Apply(ApplyArgs),

    /// Remove every recorded member from the group and discard the state
    Destroy(StateArgs),

    /// Adopt an existing group's membership as a new resource
    Import(ImportArgs),

    /// Print a group's live membership without modifying anything
    Show {
        /// Name of the IAM group to inspect
        group: String,
    },
}

/// Apply mode arguments
#[derive(Parser, Debug)]
struct ApplyArgs {
    /// Path to the desired GroupMembership YAML file
    #[arg(short = 'f', long = "config")]
    config_file: PathBuf,

    /// Path to the local state file
    #[arg(long, default_value = "groupsync.state.yaml")]
    state_file: PathBuf,
}

/// Arguments for state-only commands
#[derive(Parser, Debug)]
struct StateArgs {
    /// Path to the local state file
    #[arg(long, default_value = "groupsync.state.yaml")]
    state_file: PathBuf,
}

/// Import mode arguments
#[derive(Parser, Debug)]
struct ImportArgs {
    /// Name of the IAM group to import
    group: String,

    /// Path to the local state file
    #[arg(long, default_value = "groupsync.state.yaml")]
    state_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let iam = SdkIamClient::from_env().await;
    let reconciler = Reconciler::new(Arc::new(iam));

    match cli.command {
        Commands::Apply(args) => run_apply(&reconciler, args).await,
        Commands::Destroy(args) => run_destroy(&reconciler, args).await,
        Commands::Import(args) => run_import(&reconciler, args).await,
        Commands::Show { group } => run_show(&reconciler, &group).await,
    }
}

/// Converge live membership to the desired record and persist the result
async fn run_apply(reconciler: &Reconciler, args: ApplyArgs) -> anyhow::Result<()> {
    let desired = read_record(&args.config_file).await?;
    desired.validate()?;

    let result = match read_state(&args.state_file).await? {
        None => {
            info!(group = %desired.group, "no prior state, creating resource");
            reconciler.create(desired).await?
        }
        Some(state) if state.name != desired.name || state.group != desired.group => {
            // name and group are force-new fields: replace the resource
            info!(
                old_group = %state.group,
                new_group = %desired.group,
                "immutable field changed, replacing resource"
            );
            reconciler.delete(state).await?;
            reconciler.create(desired).await?
        }
        Some(state) => reconciler.update(state, desired.users).await?,
    };

    if result.exists() {
        write_state(&args.state_file, &result).await?;
    } else {
        // The group vanished underneath us; the resource is gone
        remove_state(&args.state_file).await?;
    }

    println!("{}", result.to_yaml()?);
    Ok(())
}

/// Remove all recorded members and discard local state
async fn run_destroy(reconciler: &Reconciler, args: StateArgs) -> anyhow::Result<()> {
    let state = read_state(&args.state_file).await?.ok_or_else(|| {
        anyhow::anyhow!("no state found at {:?}, nothing to destroy", args.state_file)
    })?;

    reconciler.delete(state).await?;
    remove_state(&args.state_file).await?;

    println!("destroyed");
    Ok(())
}

/// Adopt an existing group and persist its observed membership as state
async fn run_import(reconciler: &Reconciler, args: ImportArgs) -> anyhow::Result<()> {
    let record = reconciler.import(&args.group)?;
    let record = reconciler.read(record).await?;

    if !record.exists() {
        anyhow::bail!("group {:?} does not exist", args.group);
    }

    write_state(&args.state_file, &record).await?;
    println!("{}", record.to_yaml()?);
    Ok(())
}

/// Print a group's live membership
async fn run_show(reconciler: &Reconciler, group: &str) -> anyhow::Result<()> {
    let record = reconciler.import(group)?;
    let record = reconciler.read(record).await?;

    if !record.exists() {
        anyhow::bail!("group {:?} does not exist", group);
    }

    println!("{}", record.to_yaml()?);
    Ok(())
}

/// Read and parse a GroupMembership record from a YAML file
async fn read_record(path: &PathBuf) -> anyhow::Result<GroupMembership> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {:?}: {}", path, e))?;
    serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("failed to parse GroupMembership from {:?}: {}", path, e))
}

/// Read the state file if it exists
async fn read_state(path: &PathBuf) -> anyhow::Result<Option<GroupMembership>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let record = serde_yaml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("failed to parse state {:?}: {}", path, e))?;
            Ok(Some(record))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow::anyhow!("failed to read state {:?}: {}", path, e)),
    }
}

/// Persist the record to the state file
async fn write_state(path: &PathBuf, record: &GroupMembership) -> anyhow::Result<()> {
    let yaml = record.to_yaml()?;
    tokio::fs::write(path, yaml)
        .await
        .map_err(|e| anyhow::anyhow!("failed to write state {:?}: {}", path, e))
}

/// Remove the state file, tolerating it already being gone
async fn remove_state(path: &PathBuf) -> anyhow::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::anyhow!("failed to remove state {:?}: {}", path, e)),
    }
}
