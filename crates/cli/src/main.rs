//! certchain command line interface
//!
//! Issuer and verifier tooling over a registry persisted in a local sled
//! data directory. The `--caller` address stands in for the identity the
//! ledger would attach to a signed transaction.

mod settings;

use anyhow::{Context, Result};
use certchain_registry::{
    CredentialRegistry, MemoryEventSink, NoopEventSink, RegistryConfig, SledSnapshotStore,
    SnapshotStore,
};
use certchain_types::{generate_lookup_token, Address, CredentialRecord, GradeScale, IssueRequest};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "certchain")]
#[command(about = "Academic credential registry tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Registry data directory (overrides configuration)
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new, empty registry
    Init {
        /// Registry owner address
        #[arg(long)]
        owner: Address,
        /// Grade scale for every credential (extended or compact)
        #[arg(long)]
        scale: Option<GradeScale>,
    },
    /// Issue a credential
    Issue(IssueCommand),
    /// Revoke the credential holding a lookup token
    Revoke {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        token: String,
    },
    /// Show the credential held by a recipient
    Show {
        #[arg(long)]
        recipient: Address,
    },
    /// Verify a credential by lookup token
    Verify {
        #[arg(long)]
        token: String,
    },
    /// Authorize an issuer (owner only)
    GrantIssuer {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        address: Address,
    },
    /// Withdraw issuer rights (owner only)
    RevokeIssuer {
        #[arg(long)]
        caller: Address,
        #[arg(long)]
        address: Address,
    },
    /// Report the roles held by an address
    Role {
        #[arg(long)]
        address: Address,
    },
    /// Registry summary
    Status,
    /// Check whether a registration number is held by an active credential
    RegUsed {
        registration_number: String,
    },
}

#[derive(Args)]
struct IssueCommand {
    /// Issuing address (owner or authorized issuer)
    #[arg(long)]
    caller: Address,
    /// Recipient address
    #[arg(long)]
    recipient: Address,
    #[arg(long)]
    registration_number: String,
    /// Holder's full name
    #[arg(long)]
    name: String,
    /// School
    #[arg(long)]
    school: String,
    /// Department
    #[arg(long)]
    department: String,
    /// Examination year
    #[arg(long)]
    period: String,
    /// Grade point score, 0.0 to 4.0
    #[arg(long)]
    score: String,
    /// Issue date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    issued_on: Option<NaiveDate>,
    /// Lookup token; a random one is generated when omitted
    #[arg(long)]
    token: Option<String>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        settings.data_dir = data_dir;
    }

    for line in run(cli.command, &settings)? {
        println!("{line}");
    }
    Ok(())
}

/// Open the store for `settings.data_dir` and load the registry in it.
fn open_registry(
    settings: &Settings,
) -> Result<(SledSnapshotStore, CredentialRegistry, MemoryEventSink)> {
    let store = SledSnapshotStore::open(&settings.data_dir)
        .with_context(|| format!("failed to open data dir {}", settings.data_dir.display()))?;
    let snapshot = store.load()?.with_context(|| {
        format!(
            "no registry in {} (run `certchain init` first)",
            settings.data_dir.display()
        )
    })?;

    let sink = MemoryEventSink::new();
    let registry = CredentialRegistry::from_snapshot(snapshot, Arc::new(sink.clone()))
        .context("stored registry failed validation")?;
    Ok((store, registry, sink))
}

/// Persist the registry and render the events the mutation produced.
fn commit(
    store: &SledSnapshotStore,
    registry: &CredentialRegistry,
    sink: &MemoryEventSink,
) -> Result<Vec<String>> {
    store.save(&registry.snapshot())?;
    sink.events()
        .iter()
        .map(|event| -> Result<String> { Ok(format!("event: {}", serde_json::to_string(event)?)) })
        .collect()
}

fn render_record(record: &CredentialRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "credential": record,
        "digest": record.digest_hex(),
    }))?)
}

/// Execute one command, returning the lines to print.
fn run(command: Commands, settings: &Settings) -> Result<Vec<String>> {
    match command {
        Commands::Init { owner, scale } => {
            let store = SledSnapshotStore::open(&settings.data_dir).with_context(|| {
                format!("failed to open data dir {}", settings.data_dir.display())
            })?;
            if store.load()?.is_some() {
                anyhow::bail!(
                    "registry already initialized in {}",
                    settings.data_dir.display()
                );
            }

            let config = RegistryConfig {
                grade_scale: scale.unwrap_or(settings.grade_scale),
                ..RegistryConfig::default()
            };
            let scale = config.grade_scale;
            let registry = CredentialRegistry::with_config(owner, &config, Arc::new(NoopEventSink));
            store.save(&registry.snapshot())?;
            tracing::info!(%owner, %scale, "registry initialized");
            Ok(vec![format!("Registry initialized: owner {owner}, grade scale {scale}")])
        }
        Commands::Issue(cmd) => {
            let (store, registry, sink) = open_registry(settings)?;
            let lookup_token = cmd.token.unwrap_or_else(generate_lookup_token);
            let issued_on = cmd
                .issued_on
                .unwrap_or_else(|| chrono::Local::now().date_naive());

            let request = IssueRequest {
                recipient: cmd.recipient,
                registration_number: cmd.registration_number,
                holder_name: cmd.name,
                organization_unit: cmd.school,
                sub_unit: cmd.department,
                period: cmd.period,
                grade_score: cmd.score,
                issued_on: issued_on.format("%Y-%m-%d").to_string(),
                lookup_token: lookup_token.clone(),
            };
            let serial_no = registry
                .issue_credential(&cmd.caller, request)
                .context("issuance rejected")?;

            let mut lines = vec![format!(
                "Credential issued: serial {serial_no}, token {lookup_token}"
            )];
            lines.extend(commit(&store, &registry, &sink)?);
            Ok(lines)
        }
        Commands::Revoke { caller, token } => {
            let (store, registry, sink) = open_registry(settings)?;
            registry
                .revoke_credential(&caller, &token)
                .context("revocation rejected")?;

            let mut lines = vec![format!("Credential revoked: token {token}")];
            lines.extend(commit(&store, &registry, &sink)?);
            Ok(lines)
        }
        Commands::Show { recipient } => {
            let (_, registry, _) = open_registry(settings)?;
            let record = registry.get_by_recipient(&recipient)?;
            Ok(vec![render_record(&record)?])
        }
        Commands::Verify { token } => {
            let (_, registry, _) = open_registry(settings)?;
            match registry.get_by_token(&token) {
                Ok(record) => Ok(vec![
                    "Valid credential".to_string(),
                    render_record(&record)?,
                ]),
                Err(e) => anyhow::bail!("Invalid credential: {e}"),
            }
        }
        Commands::GrantIssuer { caller, address } => {
            let (store, registry, sink) = open_registry(settings)?;
            registry
                .grant_issuer(&caller, address)
                .context("grant rejected")?;

            let mut lines = vec![format!("Issuer authorized: {address}")];
            lines.extend(commit(&store, &registry, &sink)?);
            Ok(lines)
        }
        Commands::RevokeIssuer { caller, address } => {
            let (store, registry, sink) = open_registry(settings)?;
            registry
                .revoke_issuer(&caller, &address)
                .context("issuer revocation rejected")?;

            let mut lines = vec![format!("Issuer removed: {address}")];
            lines.extend(commit(&store, &registry, &sink)?);
            Ok(lines)
        }
        Commands::Role { address } => {
            let (_, registry, _) = open_registry(settings)?;
            Ok(vec![serde_json::to_string_pretty(&json!({
                "address": address,
                "owner": registry.is_owner(&address),
                "issuer": registry.is_active_issuer(&address),
            }))?])
        }
        Commands::Status => {
            let (_, registry, _) = open_registry(settings)?;
            Ok(vec![serde_json::to_string_pretty(&json!({
                "owner": registry.owner(),
                "issuers": registry.issuers(),
                "grade_scale": registry.grade_scale(),
                "active_credentials": registry.active_count(),
                "next_serial_no": registry.next_serial_no(),
            }))?])
        }
        Commands::RegUsed {
            registration_number,
        } => {
            let (_, registry, _) = open_registry(settings)?;
            Ok(vec![registry
                .registration_number_in_use(&registration_number)
                .to_string()])
        }
    }
}
