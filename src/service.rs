//! External collaborators: type resolution and the record data service.
//!
//! The navigator only talks to these traits. The production implementation
//! shells out to the data CLI ([`SfCli`]) and resolves types through a
//! prefix cache ([`PrefixResolver`]); tests substitute in-memory fakes.

mod cli;
mod resolver;

use async_trait::async_trait;

use crate::model::{Fields, RecordEnvelope, SchemaEnvelope};

pub use cli::SfCli;
pub use resolver::{PrefixDirectory, PrefixResolver};

/// Marker the data CLI uses for a record that does not exist.
pub const NOT_FOUND_CODE: &str = "NOT_FOUND";

/// Failures raised by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("no default org found; run '{0} config set target-org <alias>'")]
    NotConfigured(String),

    #[error("cannot find the '{0}' command; is it installed and on PATH?")]
    CliMissing(String),

    #[error("{message}")]
    Command {
        /// Error name reported by the CLI, e.g. `NOT_FOUND`.
        name: Option<String>,
        message: String,
    },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Invalid(String),
}

impl ServiceError {
    /// Whether the service reported that the record does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Command { name, message } => {
                name.as_deref() == Some(NOT_FOUND_CODE) || message.contains(NOT_FOUND_CODE)
            }
            _ => false,
        }
    }
}

/// Maps an identifier to the name of its record type.
#[async_trait]
pub trait TypeResolver: Send + Sync {
    /// `Ok(None)` when no type is known for the identifier.
    async fn resolve_type(&self, id: &str) -> Result<Option<String>, ServiceError>;
}

/// Reads and writes records through the external data service.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn fetch_record(&self, object_name: &str, id: &str)
    -> Result<RecordEnvelope, ServiceError>;

    async fn fetch_schema(&self, object_name: &str) -> Result<SchemaEnvelope, ServiceError>;

    /// Fails with [`ServiceError::Invalid`] before any external call when
    /// `fields` is empty.
    async fn update_record(
        &self,
        object_name: &str,
        id: &str,
        fields: &Fields,
    ) -> Result<(), ServiceError>;

    /// Whether the connected environment is production. Errors count as no.
    async fn is_production(&self) -> bool;
}
