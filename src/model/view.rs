//! Views: the single object describing what a surface currently shows.
//!
//! `View` is a sum type with one payload struct per kind, so a loading
//! placeholder can never carry log versions and an error page can never
//! carry record data.

use std::borrow::Cow;
use std::fmt;

use super::field::FieldDefinitions;
use super::record::Fields;
use super::snapshot::VersionSnapshot;

/// Discriminant of a [`View`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Home,
    Loading,
    Error,
    Record,
    LogBrowse,
}

impl ViewKind {
    /// Whether back-navigation may return to a view of this kind.
    ///
    /// Home and Loading are not worth returning to, and an error page is
    /// only ever left through Home.
    pub fn is_resumable(self) -> bool {
        matches!(self, Self::Record | Self::LogBrowse)
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Home => "home",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Record => "record",
            Self::LogBrowse => "log",
        };
        f.write_str(name)
    }
}

/// Token attached to every loading transition.
///
/// Strictly increasing per navigator; a completion whose token no longer
/// matches the current view is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub(crate) u64);

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingView {
    pub id: String,
    pub token: RequestToken,
}

/// Category of a failed resolve/fetch, kept next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No type could be resolved for the identifier.
    Unresolved,
    /// The type resolved but no record came back.
    NotFound,
    /// The data service itself failed.
    Transport,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorView {
    pub id: String,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordView {
    pub object_name: String,
    pub id: String,
    pub data: Fields,
    pub fields: FieldDefinitions,
}

/// A browse session over every assignment of one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct LogBrowseView {
    pub variable: String,
    /// Never empty.
    pub versions: Vec<VersionSnapshot>,
    /// Index into `versions`.
    pub current: usize,
}

impl LogBrowseView {
    pub fn current_snapshot(&self) -> &VersionSnapshot {
        &self.versions[self.current]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Home,
    Loading(LoadingView),
    Error(ErrorView),
    Record(RecordView),
    LogBrowse(LogBrowseView),
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Home => ViewKind::Home,
            Self::Loading(_) => ViewKind::Loading,
            Self::Error(_) => ViewKind::Error,
            Self::Record(_) => ViewKind::Record,
            Self::LogBrowse(_) => ViewKind::LogBrowse,
        }
    }

    /// Display label: the type name, the inspected variable, or a placeholder.
    pub fn object_name(&self) -> &str {
        match self {
            Self::Home => "Inspector",
            Self::Loading(_) => "Loading",
            Self::Error(_) => "Error",
            Self::Record(r) => &r.object_name,
            Self::LogBrowse(l) => &l.variable,
        }
    }

    /// The subject identifier, or a synthetic `Version N` label.
    pub fn id(&self) -> Cow<'_, str> {
        match self {
            Self::Home => Cow::Borrowed(""),
            Self::Loading(l) => Cow::Borrowed(&l.id),
            Self::Error(e) => Cow::Borrowed(&e.id),
            Self::Record(r) => Cow::Borrowed(&r.id),
            Self::LogBrowse(l) => Cow::Owned(format!("Version {}", l.current_snapshot().version)),
        }
    }

    /// The field mapping being displayed, if any.
    pub fn data(&self) -> Option<&Fields> {
        match self {
            Self::Record(r) => Some(&r.data),
            Self::LogBrowse(l) => Some(&l.current_snapshot().data),
            Self::Home | Self::Loading(_) | Self::Error(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn snapshot(version: usize) -> VersionSnapshot {
        VersionSnapshot {
            version,
            timestamp: "12:00:00.0".into(),
            line_number: "7".into(),
            raw_line: String::new(),
            data: json!({ "n": version }).as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn resumable_kinds() {
        assert!(ViewKind::Record.is_resumable());
        assert!(ViewKind::LogBrowse.is_resumable());
        assert!(!ViewKind::Home.is_resumable());
        assert!(!ViewKind::Loading.is_resumable());
        assert!(!ViewKind::Error.is_resumable());
    }

    #[test]
    fn log_browse_labels_follow_selection() {
        let view = View::LogBrowse(LogBrowseView {
            variable: "acc".into(),
            versions: vec![snapshot(1), snapshot(2)],
            current: 1,
        });

        assert_eq!(view.object_name(), "acc");
        assert_eq!(view.id(), "Version 2");
        assert_eq!(view.data().unwrap()["n"], 2);
    }

    #[test]
    fn placeholders_carry_no_data() {
        assert!(View::Home.data().is_none());
        let loading = View::Loading(LoadingView {
            id: "001000000000001".into(),
            token: RequestToken(1),
        });
        assert!(loading.data().is_none());
        assert_eq!(loading.id(), "001000000000001");
    }
}
