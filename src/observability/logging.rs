//! # Structured Logging
//!
//! Span macros and subscriber setup for certificate store jobs.
//!
//! Every job runs inside a [`job_span!`] carrying the store type, store path
//! and a fresh `operation_id`, so warnings raised deep inside a tree walk can
//! be correlated with the job that produced them. Container mutations nest a
//! [`container_span!`] underneath.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create a tracing span for a host-facing job.
///
/// ```rust,ignore
/// let span = job_span!("inventory", StoreType::BarePem, "certs/");
/// let span = job_span!("add", StoreType::Pkcs12, "stores/p12/", alias = "web1");
/// ```
#[macro_export]
macro_rules! job_span {
    ($job:expr, $store_type:expr, $store_path:expr) => {
        tracing::info_span!(
            "certstore_job",
            job = %$job,
            store_type = %$store_type,
            store_path = %$store_path,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($job:expr, $store_type:expr, $store_path:expr, $($field:tt)*) => {
        tracing::info_span!(
            "certstore_job",
            job = %$job,
            store_type = %$store_type,
            store_path = %$store_path,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Create a tracing span for one container load/mutate/persist cycle.
#[macro_export]
macro_rules! container_span {
    ($operation:expr, $path:expr) => {
        tracing::debug_span!(
            "container_operation",
            operation = %$operation,
            path = %$path,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $path:expr, $($field:tt)*) => {
        tracing::debug_span!(
            "container_operation",
            operation = %$operation,
            path = %$path,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `debug` when verbose and
/// `info` otherwise. Calling this twice is harmless.
pub fn init_logging(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = FmtSubscriber::builder().with_env_filter(filter).with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish()),
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish()),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Global subscriber already installed, keeping it");
    }
}

/// Log the effective store configuration (never the token).
pub fn log_store_config(config: &crate::config::StoreConfig) {
    tracing::info!(
        store_type = %config.store_type,
        store_path = %config.store_path,
        mount_point = %config.mount_point,
        namespace = ?config.namespace,
        subfolder_inventory = config.subfolder_inventory,
        include_cert_chain = config.include_cert_chain,
        vault_server_url = %config.vault_server_url,
        token_configured = config.vault_token.is_some(),
        "Certificate store configuration"
    );
}
