//! Core data model for the inspector.
//!
//! These types are shared by the navigator, the log history parser, and the
//! external service layer: views and their payloads, field definitions
//! derived from a type's schema, parsed log snapshots, and the envelopes the
//! data CLI answers with.

mod field;
mod record;
mod snapshot;
mod view;

pub use field::FieldDefinitions;
pub use record::{Fields, RawField, RecordEnvelope, Schema, SchemaEnvelope};
pub use snapshot::{SCALAR_KEY, VersionSnapshot};
pub use view::{
    ErrorKind, ErrorView, LoadingView, LogBrowseView, RecordView, RequestToken, View, ViewKind,
};
