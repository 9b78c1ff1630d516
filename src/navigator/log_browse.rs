//! Null filtering and diffing within a log browse session.
//!
//! The null filter hides null-equivalent versions. Selection must always
//! point at a visible version when one exists, and diffs compare against
//! the previous *visible* version so hidden versions never take part.

use serde_json::Value;

use crate::model::{LogBrowseView, VersionSnapshot};

/// A field of the selected version that differs from the previous visible one.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    /// `None` when the field is absent in the previous version.
    pub previous: Option<Value>,
}

/// Indices of versions not hidden by the filter, in order.
pub fn visible_indices(view: &LogBrowseView, ignore_nulls: bool) -> Vec<usize> {
    view.versions
        .iter()
        .enumerate()
        .filter(|(_, v)| !(ignore_nulls && v.is_null_equivalent()))
        .map(|(i, _)| i)
        .collect()
}

/// Move the selection onto a visible version if it is hidden.
///
/// Prefers the nearest visible version after the current one, then the
/// nearest before it. With nothing visible the selection is left alone.
pub fn reselect(view: &mut LogBrowseView, ignore_nulls: bool) {
    let visible = visible_indices(view, ignore_nulls);
    if visible.contains(&view.current) {
        return;
    }

    let current = view.current;
    let replacement = visible
        .iter()
        .copied()
        .find(|&i| i > current)
        .or_else(|| visible.iter().rev().copied().find(|&i| i < current));

    if let Some(index) = replacement {
        tracing::debug!(from = current, to = index, "selected version hidden; reselecting");
        view.current = index;
    }
}

/// The version the selection is compared against, if any.
pub fn previous_visible(view: &LogBrowseView, ignore_nulls: bool) -> Option<&VersionSnapshot> {
    let visible = visible_indices(view, ignore_nulls);
    let position = visible.iter().position(|&i| i == view.current)?;
    let previous = position.checked_sub(1)?;
    view.versions.get(visible[previous])
}

/// Fields of the selected version whose serialized value differs from the
/// previous visible version.
///
/// Empty for the first visible version. A field missing from the previous
/// version always counts as changed, even when its new value is `null`.
pub fn diff(view: &LogBrowseView, ignore_nulls: bool) -> Vec<FieldChange> {
    let Some(previous) = previous_visible(view, ignore_nulls) else {
        return Vec::new();
    };

    view.current_snapshot()
        .data
        .iter()
        .filter_map(|(field, value)| {
            let before = previous.data.get(field);
            let changed = before.is_none_or(|b| b.to_string() != value.to_string());
            changed.then(|| FieldChange {
                field: field.clone(),
                previous: before.cloned(),
            })
        })
        .collect()
}
