//! # Command Line Interface
//!
//! Runs the certificate store jobs against a Vault server from the shell.
//! Store settings come from `CERTSTORE_*` / `VAULT_*` environment variables
//! and may be overridden with global flags.

pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{StoreConfig, StoreType};
use crate::jobs::{CertStoreJobs, JobOutcome, JobResult};
use crate::observability::{init_logging, log_store_config, LogFormat};
use crate::secrets::paths::normalize_store_path;
use crate::secrets::SecretString;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "vault-certstore")]
#[command(about = "Manage certificate stores kept in HashiCorp Vault")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store type (pem, jks, pkcs12, pfx, pki or a capability tag)
    #[arg(long, global = true)]
    pub store_type: Option<StoreType>,

    /// Store path: folder for PEM stores, container secret otherwise
    #[arg(long, global = true)]
    pub store_path: Option<String>,

    /// KV v2 (or PKI) mount point
    #[arg(long, global = true)]
    pub mount_point: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Vault server address
    #[arg(long, global = true)]
    pub vault_addr: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the certificates in the store
    Inventory {
        /// Walk subfolders of the store path (PEM stores)
        #[arg(long)]
        subfolders: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },

    /// Find stores of the configured type under a root path
    Discover {
        /// Folder to search from
        root: String,
    },

    /// Add or replace a certificate from a PFX file
    Add {
        /// Alias to store the certificate under
        alias: String,

        /// PFX (or certificate) file to upload
        #[arg(long)]
        pfx_file: PathBuf,

        /// Password of the PFX file
        #[arg(long, env = "CERTSTORE_PFX_PASSWORD", hide_env_values = true)]
        pfx_password: String,

        /// Store only the leaf certificate
        #[arg(long)]
        no_chain: bool,
    },

    /// Remove a certificate by alias
    Remove {
        /// Alias to remove
        alias: String,
    },

    /// Create an empty store at the store path
    Create,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_format = if cli.json_logs { LogFormat::Json } else { LogFormat::Text };
    init_logging(log_format, cli.verbose);

    let mut config = resolve_config(&cli)?;
    if let Commands::Inventory { subfolders: true, .. } = cli.command {
        config.subfolder_inventory = true;
    }
    log_store_config(&config);

    let jobs = CertStoreJobs::from_config(config).context("Failed to connect to Vault")?;

    match cli.command {
        Commands::Inventory { output, .. } => {
            let result = jobs.get_certificates().await;
            if output == OutputFormat::Table {
                output::print_inventory_table(result.data.as_deref().unwrap_or_default());
                for message in &result.messages {
                    eprintln!("warning: {}", message);
                }
            } else {
                output::print_output(&result, output)?;
            }
            finish(&result)
        }
        Commands::Discover { root } => {
            let result = jobs.get_vaults(&root).await;
            output::print_json(&result)?;
            finish(&result)
        }
        Commands::Add { alias, pfx_file, pfx_password, no_chain } => {
            use base64::Engine as _;

            let bytes = std::fs::read(&pfx_file)
                .with_context(|| format!("Failed to read {}", pfx_file.display()))?;
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            let include_chain = !no_chain;

            let result = jobs
                .put_certificate(&alias, &encoded, &SecretString::new(pfx_password), include_chain)
                .await;
            output::print_json(&result)?;
            finish(&result)
        }
        Commands::Remove { alias } => {
            let result = jobs.remove_certificate(&alias).await;
            output::print_json(&result)?;
            finish(&result)
        }
        Commands::Create => {
            let result = jobs.create_cert_store().await;
            output::print_json(&result)?;
            finish(&result)
        }
    }
}

/// Environment configuration with command line overrides applied.
fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match (StoreConfig::from_env(), cli.store_type) {
        (Ok(config), _) => config,
        (Err(_), Some(store_type)) => StoreConfig::new(store_type, ""),
        (Err(e), None) => {
            return Err(e).context("Set CERTSTORE_STORE_TYPE or pass --store-type");
        }
    };

    if let Some(store_type) = cli.store_type {
        config.store_type = store_type;
    }
    if let Some(ref path) = cli.store_path {
        config.store_path = normalize_store_path(path);
    }
    if let Some(ref mount) = cli.mount_point {
        config.mount_point = mount.clone();
    }
    if let Some(ref namespace) = cli.namespace {
        config.namespace = Some(namespace.clone());
    }
    if let Some(ref address) = cli.vault_addr {
        config.vault_server_url = address.clone();
    }
    if config.vault_token.is_none() {
        config.vault_token = std::env::var("VAULT_TOKEN").ok().map(SecretString::new);
    }

    config.validate().context("Invalid store configuration")?;
    Ok(config)
}

fn finish<T>(result: &JobResult<T>) -> anyhow::Result<()> {
    match result.outcome {
        JobOutcome::Success | JobOutcome::Warning => Ok(()),
        JobOutcome::Failure => anyhow::bail!("Job failed: {}", result.messages.join("; ")),
    }
}
