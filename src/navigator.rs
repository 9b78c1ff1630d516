//! The navigator: single authority over what a surface displays.
//!
//! Owns the current [`View`], the back-navigation history, the edit form,
//! and the null filter. Every trigger (submit, drill, scan, version change,
//! filter toggle, edit, save, back, home) runs to completion against this
//! state; triggers that need the external services are split in two:
//!
//! - `begin_*` performs the synchronous transition (usually to Loading)
//!   and hands back a ticket carrying a fresh [`RequestToken`].
//! - `finish_*` applies the service outcome, but only if the ticket still
//!   matches what is displayed. A completion superseded by a newer request,
//!   a back-navigation, or a log scan is discarded.
//!
//! [`Navigator::inspect`], [`Navigator::drill`] and [`Navigator::save`]
//! compose the two halves for callers that await inline.

mod edit;
mod history;
mod load;
mod log_browse;

use serde_json::Value;

use crate::identifier;
use crate::log_history;
use crate::model::{
    ErrorView, FieldDefinitions, Fields, LoadingView, LogBrowseView, RecordView, RequestToken,
    View, ViewKind,
};
use crate::service::{RecordService, ServiceError, TypeResolver};

pub use edit::EditForm;
pub use history::HistoryStack;
pub use load::{InspectError, LoadedRecord, load_record, refetch};
pub use log_browse::FieldChange;

/// Longest value shown per field in a save report.
const REPORT_VALUE_MAX: usize = 50;

/// A trigger that was rejected without changing what is displayed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NavigationError {
    #[error("'{0}' is not a valid record id or URL")]
    InvalidIdentifier(String),

    #[error("'{0}' is not an identifier")]
    NotDrillable(String),

    #[error("{0} is already displayed")]
    AlreadyShowing(String),

    #[error("variable name is empty")]
    EmptyVariable,

    #[error("no assignments found for '{0}'")]
    NoAssignments(String),

    #[error("cannot {action} in the {kind} view")]
    WrongView { action: &'static str, kind: ViewKind },

    #[error("version index {index} is out of range ({len} versions)")]
    VersionOutOfRange { index: usize, len: usize },

    #[error("version index {0} is hidden by the null filter")]
    HiddenVersion(usize),

    #[error("not in edit mode")]
    NotEditing,

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error("field {0} is not editable")]
    ReadOnlyField(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("no fields to update")]
    NothingToSave,

    #[error("no fields have been modified")]
    NothingModified,

    #[error("update cancelled")]
    Cancelled,

    #[error("update failed: {0}")]
    UpdateFailed(ServiceError),
}

/// A pending resolve/fetch started by [`Navigator::begin_inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectTicket {
    pub id: String,
    pub token: RequestToken,
}

/// A pending update started by [`Navigator::begin_save`].
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    pub object_name: String,
    pub id: String,
    pub updates: Fields,
    token: RequestToken,
}

/// Which values a preset is saved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetScope {
    /// Every editable value on the form.
    All,
    /// Only values changed since the record was loaded.
    Modified,
}

/// Summary of a completed update.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub object_name: String,
    pub id: String,
    /// Field and display value, truncated for reporting.
    pub changes: Vec<(String, String)>,
    /// Whether the displayed record was replaced with fresh data.
    pub refreshed: bool,
}

/// Navigation state of one surface.
#[derive(Debug)]
pub struct Navigator {
    current: View,
    history: HistoryStack,
    editing: Option<EditForm>,
    ignore_nulls: bool,
    saving: Option<RequestToken>,
    last_token: u64,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: View::Home,
            history: HistoryStack::default(),
            editing: None,
            ignore_nulls: false,
            saving: None,
            last_token: 0,
        }
    }

    // ── Accessors ──

    pub fn current(&self) -> &View {
        &self.current
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn edit_form(&self) -> Option<&EditForm> {
        self.editing.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn ignore_nulls(&self) -> bool {
        self.ignore_nulls
    }

    /// Whether the record `id` is what is currently displayed.
    pub fn is_showing(&self, id: &str) -> bool {
        matches!(&self.current, View::Record(record) if record.id == id)
    }

    /// Versions offered for selection under the current filter.
    ///
    /// Empty outside a log browse session.
    pub fn visible_versions(&self) -> Vec<usize> {
        match &self.current {
            View::LogBrowse(view) => log_browse::visible_indices(view, self.ignore_nulls),
            _ => Vec::new(),
        }
    }

    /// Fields of the selected version that changed since the previous
    /// visible version.
    pub fn changes(&self) -> Vec<FieldChange> {
        match &self.current {
            View::LogBrowse(view) => log_browse::diff(view, self.ignore_nulls),
            _ => Vec::new(),
        }
    }

    // ── Record navigation ──

    /// Submit free text (a bare id, a URL, or pasted text) for inspection.
    pub fn begin_inspect(&mut self, input: &str) -> Result<InspectTicket, NavigationError> {
        let id = identifier::parse(input)
            .ok_or_else(|| NavigationError::InvalidIdentifier(input.trim().to_string()))?;
        self.start_loading(id)
    }

    /// Drill into an identifier-looking value shown in the current record.
    pub fn begin_drill(&mut self, value: &str) -> Result<InspectTicket, NavigationError> {
        if self.current.kind() != ViewKind::Record {
            return Err(self.wrong_view("drill into a value"));
        }
        if !identifier::is_identifier(value) {
            return Err(NavigationError::NotDrillable(value.to_string()));
        }
        self.start_loading(value.to_string())
    }

    fn start_loading(&mut self, id: String) -> Result<InspectTicket, NavigationError> {
        if self.is_showing(&id) {
            return Err(NavigationError::AlreadyShowing(id));
        }

        let token = self.next_token();
        tracing::debug!(id = %id, token = token.0, "loading record");
        self.transition(
            View::Loading(LoadingView {
                id: id.clone(),
                token,
            }),
            true,
        );
        Ok(InspectTicket { id, token })
    }

    /// Apply the outcome of a resolve/fetch.
    ///
    /// Returns `false` when the ticket is stale and the outcome was dropped.
    pub fn finish_inspect(
        &mut self,
        ticket: &InspectTicket,
        outcome: Result<LoadedRecord, InspectError>,
    ) -> bool {
        let pending = matches!(
            &self.current,
            View::Loading(loading) if loading.token == ticket.token
        );
        if !pending {
            tracing::debug!(id = %ticket.id, token = ticket.token.0, "discarding stale response");
            return false;
        }

        self.current = match outcome {
            Ok(loaded) => View::Record(RecordView {
                fields: FieldDefinitions::from_schema(loaded.schema.as_ref()),
                object_name: loaded.object_name,
                id: ticket.id.clone(),
                data: loaded.data,
            }),
            Err(error) => {
                tracing::info!(id = %ticket.id, error = %error, "inspection failed");
                View::Error(ErrorView {
                    id: ticket.id.clone(),
                    kind: error.kind(),
                    message: error.to_string(),
                })
            }
        };
        true
    }

    /// Submit input and await the resolve/fetch inline.
    pub async fn inspect<R, S>(
        &mut self,
        input: &str,
        resolver: &R,
        records: &S,
    ) -> Result<&View, NavigationError>
    where
        R: TypeResolver + ?Sized,
        S: RecordService + ?Sized,
    {
        let ticket = self.begin_inspect(input)?;
        let outcome = load_record(&ticket.id, resolver, records).await;
        self.finish_inspect(&ticket, outcome);
        Ok(&self.current)
    }

    /// Drill into a value and await the resolve/fetch inline.
    pub async fn drill<R, S>(
        &mut self,
        value: &str,
        resolver: &R,
        records: &S,
    ) -> Result<&View, NavigationError>
    where
        R: TypeResolver + ?Sized,
        S: RecordService + ?Sized,
    {
        let ticket = self.begin_drill(value)?;
        let outcome = load_record(&ticket.id, resolver, records).await;
        self.finish_inspect(&ticket, outcome);
        Ok(&self.current)
    }

    // ── Log browsing ──

    /// Scan log text for assignments of `variable` and browse them.
    ///
    /// Returns the number of versions found. Nothing changes when there
    /// are none.
    pub fn open_log(&mut self, variable: &str, log: &str) -> Result<usize, NavigationError> {
        let variable = variable.trim();
        if variable.is_empty() {
            return Err(NavigationError::EmptyVariable);
        }

        let versions = log_history::parse_log(log, variable);
        if versions.is_empty() {
            return Err(NavigationError::NoAssignments(variable.to_string()));
        }

        let count = versions.len();
        let mut view = LogBrowseView {
            variable: variable.to_string(),
            versions,
            current: 0,
        };
        log_browse::reselect(&mut view, self.ignore_nulls);
        self.transition(View::LogBrowse(view), true);
        Ok(count)
    }

    /// Select another version of the same browse session, in place.
    ///
    /// Only versions the null filter leaves visible can be selected.
    pub fn select_version(&mut self, index: usize) -> Result<(), NavigationError> {
        let kind = self.current.kind();
        let View::LogBrowse(view) = &mut self.current else {
            return Err(NavigationError::WrongView {
                action: "select a version",
                kind,
            });
        };
        if index >= view.versions.len() {
            return Err(NavigationError::VersionOutOfRange {
                index,
                len: view.versions.len(),
            });
        }
        if !log_browse::visible_indices(view, self.ignore_nulls).contains(&index) {
            return Err(NavigationError::HiddenVersion(index));
        }
        view.current = index;
        Ok(())
    }

    /// Turn the null filter on or off, keeping the selection visible.
    pub fn set_ignore_nulls(&mut self, ignore: bool) {
        self.ignore_nulls = ignore;
        if let View::LogBrowse(view) = &mut self.current {
            log_browse::reselect(view, ignore);
        }
    }

    // ── Back and home ──

    /// Return to the most recent resumable view, or Home if there is none.
    pub fn back(&mut self) -> &View {
        self.editing = None;
        self.current = match self.history.pop_resumable() {
            Some(View::LogBrowse(mut view)) => {
                log_browse::reselect(&mut view, self.ignore_nulls);
                View::LogBrowse(view)
            }
            Some(view) => view,
            None => View::Home,
        };
        tracing::debug!(kind = %self.current.kind(), "navigated back");
        &self.current
    }

    /// Show Home, keeping history so back still works.
    pub fn go_home(&mut self) {
        self.transition(View::Home, true);
        self.ignore_nulls = false;
    }

    /// Show Home and forget everything: history, edits, and the filter.
    pub fn start_fresh(&mut self) {
        self.history.clear();
        self.editing = None;
        self.ignore_nulls = false;
        self.current = View::Home;
    }

    // ── Editing ──

    /// Enter or leave edit mode on the current record.
    pub fn toggle_edit(&mut self) -> Result<bool, NavigationError> {
        if self.saving.is_some() {
            return Err(NavigationError::SaveInProgress);
        }
        let View::Record(record) = &self.current else {
            return Err(self.wrong_view("edit"));
        };

        self.editing = match self.editing {
            Some(_) => None,
            None => Some(EditForm::new(record)),
        };
        Ok(self.editing.is_some())
    }

    /// Set an editable field from user-entered text.
    pub fn set_field(&mut self, field: &str, input: &str) -> Result<(), NavigationError> {
        let View::Record(record) = &self.current else {
            return Err(self.wrong_view("edit"));
        };
        let form = self.editing.as_mut().ok_or(NavigationError::NotEditing)?;

        let definition = record
            .fields
            .get(field)
            .filter(|_| form.contains(field))
            .ok_or_else(|| NavigationError::ReadOnlyField(field.to_string()))?;
        let value = definition
            .coerce(input)
            .map_err(NavigationError::InvalidValue)?;

        form.set(field, value);
        Ok(())
    }

    /// Apply a loaded preset onto the edit form without saving.
    ///
    /// Returns the fields that were applied.
    pub fn apply_preset(&mut self, preset: &Fields) -> Result<Vec<String>, NavigationError> {
        let form = self.editing.as_mut().ok_or(NavigationError::NotEditing)?;
        Ok(form.apply(preset))
    }

    /// The values a preset would be saved from.
    pub fn preset_payload(&self, scope: PresetScope) -> Result<Fields, NavigationError> {
        let form = self.editing.as_ref().ok_or(NavigationError::NotEditing)?;
        let payload = match scope {
            PresetScope::All => form.all(),
            PresetScope::Modified => form.modified(),
        };
        if payload.is_empty() {
            return Err(NavigationError::NothingModified);
        }
        Ok(payload)
    }

    /// Start saving `updates` to the current record.
    ///
    /// Further edit toggles and saves are refused until the save finishes.
    pub fn begin_save(&mut self, updates: Fields) -> Result<SaveTicket, NavigationError> {
        if self.saving.is_some() {
            return Err(NavigationError::SaveInProgress);
        }
        let View::Record(record) = &self.current else {
            return Err(self.wrong_view("save"));
        };
        if self.editing.is_none() {
            return Err(NavigationError::NotEditing);
        }
        if updates.is_empty() {
            return Err(NavigationError::NothingToSave);
        }

        let ticket = SaveTicket {
            object_name: record.object_name.clone(),
            id: record.id.clone(),
            updates,
            token: self.next_token(),
        };
        self.saving = Some(ticket.token);
        Ok(ticket)
    }

    /// Release a save that was not carried out (e.g. production declined).
    pub fn abandon_save(&mut self, ticket: &SaveTicket) {
        if self.saving == Some(ticket.token) {
            self.saving = None;
        }
    }

    /// Apply the outcome of an update: fresh record data, or the failure.
    ///
    /// On success the displayed record is refreshed in place (no history
    /// entry) if it is still the one that was saved, and edit mode ends.
    /// On failure the view and the edit form are left as they were.
    pub fn finish_save(
        &mut self,
        ticket: &SaveTicket,
        outcome: Result<Fields, ServiceError>,
    ) -> Result<SaveReport, NavigationError> {
        self.abandon_save(ticket);

        let fresh = outcome.map_err(|e| {
            tracing::warn!(id = %ticket.id, error = %e, "update failed");
            NavigationError::UpdateFailed(e)
        })?;

        let mut refreshed = false;
        if let View::Record(record) = &mut self.current
            && record.id == ticket.id
        {
            record.data = fresh;
            self.editing = None;
            refreshed = true;
        }

        Ok(SaveReport {
            object_name: ticket.object_name.clone(),
            id: ticket.id.clone(),
            changes: ticket
                .updates
                .iter()
                .map(|(field, value)| (field.clone(), report_value(value)))
                .collect(),
            refreshed,
        })
    }

    /// Save inline: confirm on production, update, then refresh.
    ///
    /// `confirm` is asked only when the service reports a production
    /// environment; declining abandons the save.
    pub async fn save<S, F>(
        &mut self,
        updates: Fields,
        records: &S,
        confirm: F,
    ) -> Result<SaveReport, NavigationError>
    where
        S: RecordService + ?Sized,
        F: FnOnce(&SaveTicket) -> bool,
    {
        let ticket = self.begin_save(updates)?;

        if records.is_production().await && !confirm(&ticket) {
            self.abandon_save(&ticket);
            return Err(NavigationError::Cancelled);
        }

        let outcome = match records
            .update_record(&ticket.object_name, &ticket.id, &ticket.updates)
            .await
        {
            Ok(()) => refetch(&ticket.object_name, &ticket.id, records).await,
            Err(e) => Err(e),
        };
        self.finish_save(&ticket, outcome)
    }

    // ── Internals ──

    /// Replace the current view, remembering the old one if it is worth
    /// returning to. Edit mode never survives a transition.
    fn transition(&mut self, next: View, new_subject: bool) {
        let previous = std::mem::replace(&mut self.current, next);
        self.editing = None;
        if new_subject && previous.kind().is_resumable() {
            self.history.push(previous);
        }
    }

    fn next_token(&mut self) -> RequestToken {
        self.last_token += 1;
        RequestToken(self.last_token)
    }

    fn wrong_view(&self, action: &'static str) -> NavigationError {
        NavigationError::WrongView {
            action,
            kind: self.current.kind(),
        }
    }
}

fn report_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > REPORT_VALUE_MAX {
        let cut: String = text.chars().take(REPORT_VALUE_MAX).collect();
        format!("{cut}...")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::model::{ErrorKind, RawField, RecordEnvelope, Schema, SchemaEnvelope};

    const ACCOUNT_ID: &str = "001Dn00000AbCdEIAZ";
    const CONTACT_ID: &str = "003Dn00000XyZwQIAV";
    const MISSING_ID: &str = "001Dn00000ZzZzZIAZ";
    const UNKNOWN_ID: &str = "a0ZDn00000AbCdEIAZ";

    /// In-memory org: resolves by prefix and serves records from a map.
    struct FakeOrg {
        types: BTreeMap<String, String>,
        records: Mutex<BTreeMap<String, Fields>>,
        production: bool,
        reject_updates: bool,
        updates: Mutex<Vec<(String, Fields)>>,
    }

    impl FakeOrg {
        fn new() -> Self {
            let types = [("001", "Account"), ("003", "Contact")]
                .into_iter()
                .map(|(p, t)| (p.to_string(), t.to_string()))
                .collect();
            let records = [
                (
                    ACCOUNT_ID,
                    json!({
                        "attributes": { "type": "Account" },
                        "Id": ACCOUNT_ID,
                        "Name": "Acme",
                        "Rating": null,
                        "Primary_Contact__c": CONTACT_ID,
                    }),
                ),
                (
                    CONTACT_ID,
                    json!({ "Id": CONTACT_ID, "LastName": "Doe", "AccountId": ACCOUNT_ID }),
                ),
            ]
            .into_iter()
            .map(|(id, data)| (id.to_string(), fields(data)))
            .collect();

            Self {
                types,
                records: Mutex::new(records),
                production: false,
                reject_updates: false,
                updates: Mutex::new(Vec::new()),
            }
        }

        fn update_count(&self) -> usize {
            self.updates.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TypeResolver for FakeOrg {
        async fn resolve_type(&self, id: &str) -> Result<Option<String>, ServiceError> {
            Ok(self.types.get(&id[..3]).cloned())
        }
    }

    #[async_trait]
    impl RecordService for FakeOrg {
        async fn fetch_record(
            &self,
            _object_name: &str,
            id: &str,
        ) -> Result<RecordEnvelope, ServiceError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .map(RecordEnvelope::new)
                .unwrap_or_default())
        }

        async fn fetch_schema(&self, object_name: &str) -> Result<SchemaEnvelope, ServiceError> {
            let raw = |name: &str, field_type: &str, updateable: bool| RawField {
                name: name.into(),
                updateable,
                field_type: field_type.into(),
                label: name.into(),
                picklist_values: vec![],
            };
            let fields = match object_name {
                "Account" => vec![
                    raw("Id", "id", false),
                    raw("Name", "string", true),
                    raw("Rating", "string", true),
                    raw("Primary_Contact__c", "reference", false),
                ],
                _ => vec![raw("Id", "id", false), raw("LastName", "string", true)],
            };
            Ok(SchemaEnvelope {
                result: Some(Schema { fields }),
            })
        }

        async fn update_record(
            &self,
            _object_name: &str,
            id: &str,
            updates: &Fields,
        ) -> Result<(), ServiceError> {
            if self.reject_updates {
                return Err(ServiceError::Command {
                    name: Some("FIELD_CUSTOM_VALIDATION_EXCEPTION".into()),
                    message: "Rating is required".into(),
                });
            }
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), updates.clone()));
            if let Some(record) = self.records.lock().unwrap().get_mut(id) {
                for (field, value) in updates {
                    record.insert(field.clone(), value.clone());
                }
            }
            Ok(())
        }

        async fn is_production(&self) -> bool {
            self.production
        }
    }

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    fn log_line(line: usize, variable: &str, value: &str) -> String {
        format!("12:00:0{line}.1 (1)|VARIABLE_ASSIGNMENT|[{line}]|{variable}|{value}|0x1")
    }

    /// Five assignments of `acc`, the second and fourth null.
    fn sample_log() -> String {
        [
            log_line(1, "acc", r#"{"Name":"A"}"#),
            log_line(2, "acc", "null"),
            log_line(3, "acc", r#"{"Name":"B","Rating":"Hot"}"#),
            log_line(4, "acc", "null"),
            log_line(5, "acc", r#"{"Name":"C","Rating":"Hot"}"#),
        ]
        .join("\n")
    }

    fn record(nav: &Navigator) -> &RecordView {
        match nav.current() {
            View::Record(record) => record,
            other => panic!("expected a record view, got {:?}", other.kind()),
        }
    }

    fn log_view(nav: &Navigator) -> &LogBrowseView {
        match nav.current() {
            View::LogBrowse(view) => view,
            other => panic!("expected a log view, got {:?}", other.kind()),
        }
    }

    async fn showing_account(org: &FakeOrg) -> Navigator {
        let mut nav = Navigator::new();
        nav.inspect(ACCOUNT_ID, org, org).await.unwrap();
        nav
    }

    // ── Submission ──

    #[tokio::test]
    async fn submit_loads_record_without_history() {
        let org = FakeOrg::new();
        let nav = showing_account(&org).await;

        let shown = record(&nav);
        assert_eq!(shown.object_name, "Account");
        assert_eq!(shown.id, ACCOUNT_ID);
        assert!(!shown.data.contains_key("attributes"));
        assert!(shown.fields.is_updateable("Name"));
        assert_eq!(nav.history_len(), 0);
    }

    #[tokio::test]
    async fn submit_extracts_id_from_url() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        let url = format!("https://acme.lightning.force.com/lightning/r/Account/{ACCOUNT_ID}/view");
        nav.inspect(&url, &org, &org).await.unwrap();

        assert_eq!(record(&nav).id, ACCOUNT_ID);
    }

    #[test]
    fn invalid_input_leaves_state_alone() {
        let mut nav = Navigator::new();

        let err = nav.begin_inspect("not an id!").unwrap_err();

        assert!(matches!(err, NavigationError::InvalidIdentifier(_)));
        assert_eq!(nav.current(), &View::Home);
    }

    #[tokio::test]
    async fn resubmitting_displayed_record_is_a_no_op() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        let before = nav.current().clone();

        let err = nav.begin_inspect(ACCOUNT_ID).unwrap_err();

        assert_eq!(err, NavigationError::AlreadyShowing(ACCOUNT_ID.into()));
        assert_eq!(nav.current(), &before);
        assert_eq!(nav.history_len(), 0);
    }

    #[tokio::test]
    async fn loading_shows_placeholder_until_finished() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        let ticket = nav.begin_inspect(ACCOUNT_ID).unwrap();
        assert_eq!(nav.current().kind(), ViewKind::Loading);
        assert_eq!(nav.current().id(), ACCOUNT_ID);

        let outcome = load_record(&ticket.id, &org, &org).await;
        assert!(nav.finish_inspect(&ticket, outcome));
        assert_eq!(nav.current().kind(), ViewKind::Record);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        let first = nav.begin_inspect(ACCOUNT_ID).unwrap();
        let second = nav.begin_inspect(CONTACT_ID).unwrap();

        let late = load_record(&first.id, &org, &org).await;
        assert!(!nav.finish_inspect(&first, late));
        assert_eq!(nav.current().id(), CONTACT_ID);

        let fresh = load_record(&second.id, &org, &org).await;
        assert!(nav.finish_inspect(&second, fresh));
        assert_eq!(record(&nav).object_name, "Contact");
    }

    #[tokio::test]
    async fn response_after_back_is_discarded() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        let ticket = nav.begin_drill(CONTACT_ID).unwrap();
        nav.back();

        let outcome = load_record(&ticket.id, &org, &org).await;
        assert!(!nav.finish_inspect(&ticket, outcome));
        assert_eq!(record(&nav).id, ACCOUNT_ID);
    }

    // ── Failures ──

    #[tokio::test]
    async fn unresolved_type_shows_error() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        nav.inspect(UNKNOWN_ID, &org, &org).await.unwrap();

        let View::Error(error) = nav.current() else {
            panic!("expected an error view");
        };
        assert_eq!(error.kind, ErrorKind::Unresolved);
        assert!(error.message.contains(UNKNOWN_ID));
    }

    #[tokio::test]
    async fn missing_record_is_distinct_from_unresolved() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        nav.inspect(MISSING_ID, &org, &org).await.unwrap();

        let View::Error(error) = nav.current() else {
            panic!("expected an error view");
        };
        assert_eq!(error.kind, ErrorKind::NotFound);
        assert!(error.message.contains("does not exist"));
    }

    #[tokio::test]
    async fn error_is_never_pushed_to_history() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();

        nav.inspect(MISSING_ID, &org, &org).await.unwrap();
        nav.inspect(ACCOUNT_ID, &org, &org).await.unwrap();

        assert_eq!(nav.history_len(), 0);
        assert_eq!(nav.back(), &View::Home);
    }

    // ── Drill-in and back ──

    #[tokio::test]
    async fn drill_pushes_record_and_back_restores_it() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        let account = nav.current().clone();

        nav.drill(CONTACT_ID, &org, &org).await.unwrap();
        assert_eq!(record(&nav).object_name, "Contact");
        assert_eq!(nav.history_len(), 1);

        assert_eq!(nav.back(), &account);
        assert_eq!(nav.history_len(), 0);
    }

    #[tokio::test]
    async fn non_identifier_values_are_not_drillable() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        let err = nav.begin_drill("Acme").unwrap_err();

        assert_eq!(err, NavigationError::NotDrillable("Acme".into()));
        assert_eq!(record(&nav).id, ACCOUNT_ID);
    }

    #[test]
    fn drill_requires_a_record() {
        let mut nav = Navigator::new();
        let err = nav.begin_drill(ACCOUNT_ID).unwrap_err();
        assert!(matches!(
            err,
            NavigationError::WrongView {
                kind: ViewKind::Home,
                ..
            }
        ));
    }

    #[test]
    fn back_with_empty_history_lands_on_home() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.back();
        assert_eq!(nav.back(), &View::Home);
    }

    #[tokio::test]
    async fn back_never_lands_on_loading() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        let _pending = nav.begin_drill(CONTACT_ID).unwrap();
        nav.open_log("acc", &sample_log()).unwrap();

        // The pending load was not resumable, so back skips straight past it.
        assert_eq!(nav.history_len(), 1);
        assert_eq!(record(nav_back(&mut nav)).id, ACCOUNT_ID);
    }

    fn nav_back(nav: &mut Navigator) -> &Navigator {
        nav.back();
        nav
    }

    // ── Log browsing ──

    #[test]
    fn scan_opens_first_version() {
        let mut nav = Navigator::new();

        let count = nav.open_log("acc", &sample_log()).unwrap();

        assert_eq!(count, 5);
        let view = log_view(&nav);
        assert_eq!(view.current, 0);
        assert_eq!(nav.current().object_name(), "acc");
        assert_eq!(nav.current().id(), "Version 1");
        assert_eq!(nav.history_len(), 0);
    }

    #[test]
    fn scan_without_assignments_changes_nothing() {
        let mut nav = Navigator::new();

        let err = nav.open_log("missing", &sample_log()).unwrap_err();

        assert_eq!(err, NavigationError::NoAssignments("missing".into()));
        assert_eq!(nav.current(), &View::Home);
    }

    #[test]
    fn blank_variable_is_rejected() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.open_log("  ", &sample_log()).unwrap_err(),
            NavigationError::EmptyVariable
        );
    }

    #[test]
    fn version_change_does_not_push_history() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();

        nav.select_version(2).unwrap();
        nav.select_version(4).unwrap();

        assert_eq!(log_view(&nav).current, 4);
        assert_eq!(nav.history_len(), 0);
    }

    #[test]
    fn version_out_of_range_is_rejected() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();

        let err = nav.select_version(5).unwrap_err();

        assert_eq!(err, NavigationError::VersionOutOfRange { index: 5, len: 5 });
        assert_eq!(log_view(&nav).current, 0);
    }

    #[test]
    fn hidden_versions_cannot_be_selected() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.set_ignore_nulls(true);
        nav.select_version(2).unwrap();

        let err = nav.select_version(1).unwrap_err();

        assert_eq!(err, NavigationError::HiddenVersion(1));
        assert_eq!(log_view(&nav).current, 2);
        assert!(nav.visible_versions().contains(&log_view(&nav).current));
        assert_eq!(nav.changes().len(), 2);

        nav.set_ignore_nulls(false);
        nav.select_version(1).unwrap();
        assert_eq!(log_view(&nav).current, 1);
    }

    #[tokio::test]
    async fn loaded_record_carries_schema() {
        let org = FakeOrg::new();

        let loaded = load_record(CONTACT_ID, &org, &org).await.unwrap();
        let schema = org.fetch_schema("Contact").await.unwrap().result;

        assert_eq!(
            loaded,
            LoadedRecord {
                object_name: "Contact".into(),
                data: fields(json!({
                    "Id": CONTACT_ID,
                    "LastName": "Doe",
                    "AccountId": ACCOUNT_ID,
                })),
                schema,
            }
        );
    }

    #[test]
    fn new_scan_pushes_previous_browse_session() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.select_version(2).unwrap();

        let other = log_line(9, "total", "42");
        nav.open_log("total", &other).unwrap();
        assert_eq!(nav.history_len(), 1);

        nav.back();
        let view = log_view(&nav);
        assert_eq!(view.variable, "acc");
        assert_eq!(view.current, 2);
    }

    #[test]
    fn enabling_filter_moves_selection_to_next_visible() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.select_version(1).unwrap();

        nav.set_ignore_nulls(true);

        assert_eq!(log_view(&nav).current, 2);
        assert_eq!(nav.visible_versions(), vec![0, 2, 4]);
    }

    #[test]
    fn filter_survives_version_changes_and_reset_on_home() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.set_ignore_nulls(true);
        nav.select_version(4).unwrap();
        assert!(nav.ignore_nulls());

        nav.go_home();

        assert!(!nav.ignore_nulls());
        assert_eq!(nav.current(), &View::Home);
    }

    #[test]
    fn changes_compare_against_previous_visible_version() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        nav.set_ignore_nulls(true);
        nav.select_version(4).unwrap();

        let changes = nav.changes();

        assert_eq!(
            changes,
            vec![FieldChange {
                field: "Name".into(),
                previous: Some(json!("B")),
            }]
        );
    }

    #[test]
    fn changes_are_empty_outside_logs() {
        let nav = Navigator::new();
        assert!(nav.changes().is_empty());
        assert!(nav.visible_versions().is_empty());
    }

    // ── Home ──

    #[tokio::test]
    async fn home_keeps_history_for_back() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        nav.go_home();
        assert_eq!(nav.history_len(), 1);

        assert_eq!(record(nav_back(&mut nav)).id, ACCOUNT_ID);
    }

    #[tokio::test]
    async fn start_fresh_clears_everything() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.drill(CONTACT_ID, &org, &org).await.unwrap();
        nav.toggle_edit().unwrap();

        nav.start_fresh();

        assert_eq!(nav.current(), &View::Home);
        assert!(!nav.can_go_back());
        assert!(!nav.is_editing());
    }

    #[tokio::test]
    async fn home_from_error_creates_no_history() {
        let org = FakeOrg::new();
        let mut nav = Navigator::new();
        nav.inspect(UNKNOWN_ID, &org, &org).await.unwrap();

        nav.go_home();

        assert_eq!(nav.current(), &View::Home);
        assert_eq!(nav.history_len(), 0);
    }

    // ── Editing ──

    #[tokio::test]
    async fn toggle_edit_keeps_the_view() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        let before = nav.current().clone();

        assert!(nav.toggle_edit().unwrap());
        assert!(nav.is_editing());
        assert_eq!(nav.current(), &before);

        assert!(!nav.toggle_edit().unwrap());
        assert!(!nav.is_editing());
    }

    #[test]
    fn edit_requires_a_record() {
        let mut nav = Navigator::new();
        nav.open_log("acc", &sample_log()).unwrap();
        assert!(matches!(
            nav.toggle_edit().unwrap_err(),
            NavigationError::WrongView {
                kind: ViewKind::LogBrowse,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn navigation_discards_edit_mode() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();

        nav.drill(CONTACT_ID, &org, &org).await.unwrap();
        assert!(!nav.is_editing());

        nav.toggle_edit().unwrap();
        nav.back();
        assert!(!nav.is_editing());
    }

    #[tokio::test]
    async fn set_field_coerces_and_guards_read_only() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        assert_eq!(
            nav.set_field("Name", "x").unwrap_err(),
            NavigationError::NotEditing
        );

        nav.toggle_edit().unwrap();
        nav.set_field("Name", "Acme Corp").unwrap();
        assert_eq!(
            nav.set_field("Id", "001000000000000").unwrap_err(),
            NavigationError::ReadOnlyField("Id".into())
        );
        assert_eq!(
            nav.set_field("Primary_Contact__c", CONTACT_ID).unwrap_err(),
            NavigationError::ReadOnlyField("Primary_Contact__c".into())
        );

        let modified = nav.preset_payload(PresetScope::Modified).unwrap();
        assert_eq!(modified, fields(json!({ "Name": "Acme Corp" })));
    }

    #[tokio::test]
    async fn preset_apply_and_payload_scopes() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();

        assert_eq!(
            nav.preset_payload(PresetScope::Modified).unwrap_err(),
            NavigationError::NothingModified
        );

        let applied = nav
            .apply_preset(&fields(json!({ "Rating": "Hot", "Id": "x" })))
            .unwrap();
        assert_eq!(applied, vec!["Rating"]);

        let all = nav.preset_payload(PresetScope::All).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(
            nav.preset_payload(PresetScope::Modified).unwrap(),
            fields(json!({ "Rating": "Hot" }))
        );
    }

    // ── Saving ──

    #[tokio::test]
    async fn save_refreshes_in_place() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();
        nav.set_field("Rating", "Hot").unwrap();

        let updates = nav.preset_payload(PresetScope::Modified).unwrap();
        let report = nav.save(updates, &org, |_| true).await.unwrap();

        assert!(report.refreshed);
        assert_eq!(report.changes, vec![("Rating".to_string(), "Hot".to_string())]);
        assert_eq!(record(&nav).data["Rating"], "Hot");
        assert!(!nav.is_editing());
        assert!(!nav.is_saving());
        assert_eq!(nav.history_len(), 0);
    }

    #[tokio::test]
    async fn save_failure_keeps_editing() {
        let mut org = FakeOrg::new();
        org.reject_updates = true;
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();

        let err = nav
            .save(fields(json!({ "Rating": "Hot" })), &org, |_| true)
            .await
            .unwrap_err();

        assert!(matches!(err, NavigationError::UpdateFailed(_)));
        assert!(nav.is_editing());
        assert!(!nav.is_saving());
        assert_eq!(record(&nav).data["Rating"], Value::Null);
    }

    #[tokio::test]
    async fn production_save_requires_confirmation() {
        let mut org = FakeOrg::new();
        org.production = true;
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();

        let err = nav
            .save(fields(json!({ "Rating": "Hot" })), &org, |_| false)
            .await
            .unwrap_err();

        assert_eq!(err, NavigationError::Cancelled);
        assert_eq!(org.update_count(), 0);
        assert!(nav.is_editing());
        assert!(!nav.is_saving());

        nav.save(fields(json!({ "Rating": "Hot" })), &org, |_| true)
            .await
            .unwrap();
        assert_eq!(org.update_count(), 1);
    }

    #[tokio::test]
    async fn save_in_progress_blocks_toggle_and_save() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();

        let ticket = nav.begin_save(fields(json!({ "Rating": "Hot" }))).unwrap();

        assert_eq!(nav.toggle_edit().unwrap_err(), NavigationError::SaveInProgress);
        assert_eq!(
            nav.begin_save(fields(json!({ "Name": "x" }))).unwrap_err(),
            NavigationError::SaveInProgress
        );

        nav.abandon_save(&ticket);
        assert!(!nav.is_saving());
        assert!(nav.toggle_edit().is_ok());
    }

    #[tokio::test]
    async fn save_requires_edit_mode_and_updates() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;

        assert_eq!(
            nav.begin_save(fields(json!({ "Rating": "Hot" }))).unwrap_err(),
            NavigationError::NotEditing
        );

        nav.toggle_edit().unwrap();
        assert_eq!(
            nav.begin_save(Fields::new()).unwrap_err(),
            NavigationError::NothingToSave
        );
    }

    #[tokio::test]
    async fn save_completing_after_navigation_does_not_touch_new_view() {
        let org = FakeOrg::new();
        let mut nav = showing_account(&org).await;
        nav.toggle_edit().unwrap();
        let ticket = nav.begin_save(fields(json!({ "Rating": "Hot" }))).unwrap();

        nav.open_log("acc", &sample_log()).unwrap();
        let report = nav
            .finish_save(&ticket, Ok(fields(json!({ "Id": ACCOUNT_ID }))))
            .unwrap();

        assert!(!report.refreshed);
        assert_eq!(nav.current().kind(), ViewKind::LogBrowse);
    }

    #[test]
    fn report_values_are_truncated() {
        let long = "x".repeat(60);
        let shown = report_value(&json!(long));
        assert_eq!(shown.len(), REPORT_VALUE_MAX + 3);
        assert!(shown.ends_with("..."));

        assert_eq!(report_value(&json!(12.5)), "12.5");
        assert_eq!(report_value(&Value::Null), "null");
    }
}
