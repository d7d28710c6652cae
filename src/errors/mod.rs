//! # Error Handling
//!
//! Error taxonomy for certificate store operations.
//!
//! Bulk operations (inventory, discovery) downgrade these errors to warning
//! strings and keep going; single-target operations (add, remove, create)
//! return them to the caller unchanged.

use thiserror::Error;

/// Result type for certificate store operations.
pub type Result<T> = std::result::Result<T, CertStoreError>;

/// Errors that can occur while reading or mutating certificate stores.
#[derive(Error, Debug)]
pub enum CertStoreError {
    /// Container bytes could not be parsed as the expected format.
    #[error("Invalid {format} container: {message}")]
    Format { format: String, message: String },

    /// Secret path or container alias not found.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Expected field absent from a secret.
    #[error("Missing field '{field}' in secret '{path}'")]
    MissingField { field: String, path: String },

    /// Unrecognised or unusable configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Failure reported by the secret store client.
    #[error("Secret store error: {message}")]
    Transport { message: String },

    /// Incoming certificate material is neither a key container nor a certificate.
    #[error("Unable to read certificate content: {message}")]
    AuthContent { message: String },

    /// Malformed base64 or PEM text.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Job input failed validation.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Operation not available for the configured store type.
    #[error("{operation} is not supported for {store_type} stores")]
    NotSupported { operation: String, store_type: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CertStoreError {
    /// Create a format error.
    pub fn format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format { format: format.into(), message: message.into() }
    }

    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>, path: impl Into<String>) -> Self {
        Self::MissingField { field: field.into(), path: path.into() }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Create an authentication content error.
    pub fn auth_content(message: impl Into<String>) -> Self {
        Self::AuthContent { message: message.into() }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode { message: message.into() }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Create a not supported error.
    pub fn not_supported(operation: impl Into<String>, store_type: impl Into<String>) -> Self {
        Self::NotSupported { operation: operation.into(), store_type: store_type.into() }
    }

    /// True for errors the store reports as "path does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<base64::DecodeError> for CertStoreError {
    fn from(err: base64::DecodeError) -> Self {
        Self::decode(format!("invalid base64: {}", err))
    }
}

impl From<p12_keystore::error::Error> for CertStoreError {
    fn from(err: p12_keystore::error::Error) -> Self {
        Self::format("PKCS12", err.to_string())
    }
}

impl From<vaultrs::error::ClientError> for CertStoreError {
    fn from(err: vaultrs::error::ClientError) -> Self {
        match err {
            vaultrs::error::ClientError::APIError { code: 404, errors } => {
                Self::not_found(errors.join("; "))
            }
            other => Self::transport(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for CertStoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::configuration(err.to_string())
    }
}
