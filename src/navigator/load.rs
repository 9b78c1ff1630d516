//! The resolve/fetch contract shared by submission and drill-in.

use crate::model::{ErrorKind, Fields, Schema};
use crate::service::{RecordService, ServiceError, TypeResolver};

/// Why a record could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    #[error("unknown object type for {id} (prefix not found)")]
    Unresolved { id: String },

    #[error("could not resolve the type of {id}: {source}")]
    ResolverFailed { id: String, source: ServiceError },

    #[error("record {id} does not exist in this org")]
    NotFound { id: String },

    #[error("{0}")]
    Transport(ServiceError),
}

impl InspectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unresolved { .. } | Self::ResolverFailed { .. } => ErrorKind::Unresolved,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Categorize a record fetch failure.
    fn from_fetch(id: &str, error: ServiceError) -> Self {
        if error.is_not_found() {
            Self::NotFound { id: id.to_string() }
        } else {
            Self::Transport(error)
        }
    }
}

/// Everything a record view is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecord {
    pub object_name: String,
    pub data: Fields,
    pub schema: Option<Schema>,
}

/// Resolve the identifier's type, then fetch the record and its schema
/// concurrently.
pub async fn load_record<R, S>(
    id: &str,
    resolver: &R,
    records: &S,
) -> Result<LoadedRecord, InspectError>
where
    R: TypeResolver + ?Sized,
    S: RecordService + ?Sized,
{
    let object_name = match resolver.resolve_type(id).await {
        Ok(Some(name)) => name,
        Ok(None) => return Err(InspectError::Unresolved { id: id.to_string() }),
        Err(source) => {
            return Err(InspectError::ResolverFailed {
                id: id.to_string(),
                source,
            });
        }
    };

    let (record, schema) = tokio::join!(
        records.fetch_record(&object_name, id),
        records.fetch_schema(&object_name),
    );

    let record = record.map_err(|e| InspectError::from_fetch(id, e))?;
    let schema = schema.map_err(InspectError::Transport)?;
    let data = record
        .into_fields()
        .ok_or_else(|| InspectError::NotFound { id: id.to_string() })?;

    Ok(LoadedRecord {
        object_name,
        data,
        schema: schema.result,
    })
}

/// Re-read a record after an update.
pub async fn refetch<S>(object_name: &str, id: &str, records: &S) -> Result<Fields, ServiceError>
where
    S: RecordService + ?Sized,
{
    records
        .fetch_record(object_name, id)
        .await?
        .into_fields()
        .ok_or_else(|| ServiceError::Command {
            name: Some(crate::service::NOT_FOUND_CODE.to_string()),
            message: format!("record {id} disappeared after the update"),
        })
}
