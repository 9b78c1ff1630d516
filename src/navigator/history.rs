//! Back-navigation history.

use crate::model::View;

/// Stack of prior views, most recent last.
///
/// Only resumable views (see [`ViewKind::is_resumable`]) are ever returned
/// by [`HistoryStack::pop_resumable`]; anything else that ended up on the
/// stack is skipped on the way down, so back-navigation never lands on a
/// stale spinner.
///
/// [`ViewKind::is_resumable`]: crate::model::ViewKind::is_resumable
#[derive(Debug, Default)]
pub struct HistoryStack {
    entries: Vec<View>,
}

impl HistoryStack {
    pub fn push(&mut self, view: View) {
        self.entries.push(view);
    }

    /// Pop the most recent resumable view, discarding non-resumable entries
    /// above it.
    pub fn pop_resumable(&mut self) -> Option<View> {
        while let Some(view) = self.entries.pop() {
            if view.kind().is_resumable() {
                return Some(view);
            }
            tracing::debug!(kind = %view.kind(), "skipping non-resumable history entry");
        }
        None
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{
        FieldDefinitions, Fields, LoadingView, RecordView, RequestToken, ViewKind,
    };

    fn record(id: &str) -> View {
        View::Record(RecordView {
            object_name: "Account".into(),
            id: id.into(),
            data: Fields::new(),
            fields: FieldDefinitions::default(),
        })
    }

    fn loading(id: &str) -> View {
        View::Loading(LoadingView {
            id: id.into(),
            token: RequestToken(9),
        })
    }

    #[test]
    fn pops_most_recent_first() {
        let mut history = HistoryStack::default();
        history.push(record("001000000000001"));
        history.push(record("001000000000002"));

        assert_eq!(history.pop_resumable().unwrap().id(), "001000000000002");
        assert_eq!(history.pop_resumable().unwrap().id(), "001000000000001");
        assert!(history.pop_resumable().is_none());
    }

    #[test]
    fn loading_entry_yields_the_one_beneath() {
        let mut history = HistoryStack::default();
        history.push(record("001000000000001"));
        history.push(loading("001000000000002"));

        let popped = history.pop_resumable().unwrap();

        assert_eq!(popped.kind(), ViewKind::Record);
        assert_eq!(popped.id(), "001000000000001");
        assert!(history.is_empty());
    }

    #[test]
    fn only_placeholders_yields_nothing() {
        let mut history = HistoryStack::default();
        history.push(View::Home);
        history.push(loading("001000000000002"));

        assert!(history.pop_resumable().is_none());
        assert_eq!(history.len(), 0);
    }
}
