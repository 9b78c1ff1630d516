//! The data CLI: records, schemas, updates, and org facts via `sf`.
//!
//! Every call runs the CLI directly (no shell) with `--json` and parses
//! stdout. On failure the CLI still prints a JSON error body, whose
//! `message` is preferred over raw stderr.

use std::collections::BTreeMap;
use std::io;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

use crate::model::{Fields, RecordEnvelope, SchemaEnvelope};

use super::{PrefixDirectory, RecordService, ServiceError};

/// Instance host that only production orgs log in through.
const PRODUCTION_LOGIN_HOST: &str = "login.salesforce.com";

/// Upper bound used when warming the whole prefix map.
const PREFIX_QUERY_LIMIT: u32 = 2000;

/// Handle on the external data CLI.
#[derive(Debug, Clone)]
pub struct SfCli {
    program: String,
    target_org: Option<String>,
}

impl SfCli {
    /// `program` is the CLI name or path; `target_org` is passed as
    /// `--target-org` to every org-scoped command when set.
    pub fn new(program: impl Into<String>, target_org: Option<String>) -> Self {
        Self {
            program: program.into(),
            target_org,
        }
    }

    /// Open the record in the browser.
    pub async fn open_in_browser(&self, id: &str) -> Result<(), ServiceError> {
        let path = format!("/{id}");
        self.run(&["org", "open", "--path", &path], true).await?;
        Ok(())
    }

    /// Run the CLI and return its parsed JSON output.
    ///
    /// `scoped` commands get `--target-org` when one is configured.
    async fn run(&self, args: &[&str], scoped: bool) -> Result<Value, ServiceError> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if scoped && let Some(org) = &self.target_org {
            command.args(["--target-org", org]);
        }
        command.arg("--json");

        let rendered = format!("{} {}", self.program, args.join(" "));
        tracing::debug!(command = %rendered, "running data cli");

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ServiceError::CliMissing(self.program.clone()));
            }
            Err(e) => {
                return Err(ServiceError::Command {
                    name: None,
                    message: format!("failed to run {}: {e}", self.program),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            tracing::warn!(
                command = %rendered,
                status = %output.status,
                stderr = %stderr.trim(),
                stdout = %stdout.trim(),
                "data cli failed"
            );
            return Err(command_failure(&stdout, &stderr, &output.status.to_string()));
        }

        parse_stdout(&stdout)
    }

    async fn query_records(&self, soql: &str) -> Result<Vec<Value>, ServiceError> {
        let json = self.run(&["data", "query", "--query", soql], true).await?;
        let response: QueryResponse = serde_json::from_value(json)
            .map_err(|e| ServiceError::Malformed(format!("query response: {e}")))?;
        Ok(response.result.map(|r| r.records).unwrap_or_default())
    }
}

// ── Response shapes ──

#[derive(Deserialize)]
struct QueryResponse {
    result: Option<QueryResult>,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    records: Vec<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EntityDefinition {
    key_prefix: Option<String>,
    qualified_api_name: Option<String>,
}

#[derive(Deserialize)]
struct ConfigValue {
    value: Option<String>,
}

/// Parse successful stdout. An empty body is an empty object.
fn parse_stdout(stdout: &str) -> Result<Value, ServiceError> {
    if stdout.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(stdout).map_err(|e| ServiceError::Malformed(e.to_string()))
}

/// Build the error for a non-zero exit, preferring the JSON error body.
fn command_failure(stdout: &str, stderr: &str, status: &str) -> ServiceError {
    if let Ok(body) = serde_json::from_str::<Value>(stdout) {
        let body = match &body {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return ServiceError::Command {
                name: body.get("name").and_then(Value::as_str).map(String::from),
                message: message.to_string(),
            };
        }
    }

    let stderr = stderr.trim();
    let message = if stderr.is_empty() {
        format!("command exited with {status}")
    } else {
        stderr.to_string()
    };
    ServiceError::Command {
        name: None,
        message,
    }
}

/// Whether an `org display` result describes a production org.
fn is_production_org(display: &Value) -> bool {
    let Some(result) = display.get("result") else {
        return false;
    };
    if result.get("isSandbox").and_then(Value::as_bool) == Some(false) {
        return true;
    }
    result
        .get("instanceUrl")
        .and_then(Value::as_str)
        .is_some_and(|url| url.contains(PRODUCTION_LOGIN_HOST))
}

/// Render an update mapping as the CLI's `--values` argument.
///
/// Each value is single-quoted (`Key='Value'`); backslashes and single
/// quotes inside values are backslash-escaped. `null` clears a field.
pub fn format_values(fields: &Fields) -> Result<String, ServiceError> {
    if fields.is_empty() {
        return Err(ServiceError::Invalid(
            "no updateable fields found or no changes detected".to_string(),
        ));
    }

    let pairs: Vec<String> = fields
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
            format!("{key}='{escaped}'")
        })
        .collect();

    Ok(pairs.join(" "))
}

// ── Collaborator implementations ──

#[async_trait]
impl RecordService for SfCli {
    async fn fetch_record(
        &self,
        object_name: &str,
        id: &str,
    ) -> Result<RecordEnvelope, ServiceError> {
        let json = self
            .run(
                &["data", "get", "record", "--sobject", object_name, "--record-id", id],
                true,
            )
            .await?;
        serde_json::from_value(json).map_err(|e| ServiceError::Malformed(format!("record: {e}")))
    }

    async fn fetch_schema(&self, object_name: &str) -> Result<SchemaEnvelope, ServiceError> {
        let json = self
            .run(&["sobject", "describe", "--sobject", object_name], true)
            .await?;
        serde_json::from_value(json).map_err(|e| ServiceError::Malformed(format!("schema: {e}")))
    }

    async fn update_record(
        &self,
        object_name: &str,
        id: &str,
        fields: &Fields,
    ) -> Result<(), ServiceError> {
        let values = format_values(fields)?;
        self.run(
            &[
                "data",
                "update",
                "record",
                "--sobject",
                object_name,
                "--record-id",
                id,
                "--values",
                &values,
            ],
            true,
        )
        .await?;
        Ok(())
    }

    async fn is_production(&self) -> bool {
        match self.run(&["org", "display"], true).await {
            Ok(json) => is_production_org(&json),
            Err(e) => {
                tracing::warn!(error = %e, "could not determine org type; assuming sandbox");
                false
            }
        }
    }
}

#[async_trait]
impl PrefixDirectory for SfCli {
    async fn org_user(&self) -> Result<Option<String>, ServiceError> {
        if let Some(org) = &self.target_org {
            return Ok(Some(org.clone()));
        }

        let json = self.run(&["config", "get", "target-org"], false).await?;
        let values: Vec<ConfigValue> = match json.get("result") {
            Some(result) => serde_json::from_value(result.clone())
                .map_err(|e| ServiceError::Malformed(format!("config response: {e}")))?,
            None => Vec::new(),
        };
        Ok(values
            .into_iter()
            .next()
            .and_then(|v| v.value)
            .filter(|v| !v.is_empty()))
    }

    async fn lookup_prefix(&self, prefix: &str) -> Result<Option<String>, ServiceError> {
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Ok(None);
        }

        let soql = format!(
            "SELECT QualifiedApiName FROM EntityDefinition WHERE KeyPrefix = '{prefix}' LIMIT 1"
        );
        let records = self.query_records(&soql).await?;

        Ok(records
            .into_iter()
            .filter_map(|r| serde_json::from_value::<EntityDefinition>(r).ok())
            .find_map(|d| d.qualified_api_name))
    }

    async fn all_prefixes(&self) -> Result<BTreeMap<String, String>, ServiceError> {
        let soql = format!(
            "SELECT KeyPrefix, QualifiedApiName FROM EntityDefinition \
             WHERE KeyPrefix != NULL LIMIT {PREFIX_QUERY_LIMIT}"
        );
        let records = self.query_records(&soql).await?;

        Ok(records
            .into_iter()
            .filter_map(|r| serde_json::from_value::<EntityDefinition>(r).ok())
            .filter_map(|d| Some((d.key_prefix?, d.qualified_api_name?)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn format_values_quotes_and_escapes() {
        let values = format_values(&fields(json!({
            "Name": "O'Reilly",
            "Path__c": "C:\\tmp",
            "Active__c": true,
            "Amount": 12.5,
            "Notes__c": null
        })))
        .unwrap();

        assert_eq!(
            values,
            r"Active__c='true' Amount='12.5' Name='O\'Reilly' Notes__c='' Path__c='C:\\tmp'"
        );
    }

    #[test]
    fn format_values_rejects_empty() {
        let err = format_values(&Fields::new()).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
    }

    #[test]
    fn failure_prefers_json_message() {
        let stdout = r#"{"status":1,"name":"NOT_FOUND","message":"The requested resource does not exist"}"#;

        let err = command_failure(stdout, "noise", "exit status: 1");

        assert_eq!(
            err,
            ServiceError::Command {
                name: Some("NOT_FOUND".into()),
                message: "The requested resource does not exist".into(),
            }
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn failure_reads_first_array_element() {
        let stdout = r#"[{"message":"bad field","errorCode":"INVALID_FIELD"}]"#;

        let err = command_failure(stdout, "", "exit status: 1");

        assert_eq!(err.to_string(), "bad field");
    }

    #[test]
    fn failure_falls_back_to_stderr_then_status() {
        let err = command_failure("not json", " boom \n", "exit status: 2");
        assert_eq!(err.to_string(), "boom");

        let err = command_failure("", "", "exit status: 2");
        assert_eq!(err.to_string(), "command exited with exit status: 2");
    }

    #[test]
    fn empty_stdout_is_empty_object() {
        assert_eq!(parse_stdout("  \n").unwrap(), json!({}));
        assert!(matches!(
            parse_stdout("{oops").unwrap_err(),
            ServiceError::Malformed(_)
        ));
    }

    #[test]
    fn production_detection() {
        assert!(is_production_org(&json!({ "result": { "isSandbox": false } })));
        assert!(is_production_org(&json!({
            "result": { "instanceUrl": "https://login.salesforce.com" }
        })));
        assert!(!is_production_org(&json!({
            "result": { "isSandbox": true, "instanceUrl": "https://acme--dev.sandbox.my.salesforce.com" }
        })));
        assert!(!is_production_org(&json!({})));
    }

    #[tokio::test]
    async fn missing_binary_is_reported_as_such() {
        let cli = SfCli::new("inspector-test-no-such-binary", None);

        let err = cli.fetch_schema("Account").await.unwrap_err();

        assert_eq!(
            err,
            ServiceError::CliMissing("inspector-test-no-such-binary".into())
        );
    }

    #[tokio::test]
    async fn empty_update_fails_before_running() {
        // The binary does not exist, so reaching it would yield CliMissing.
        let cli = SfCli::new("inspector-test-no-such-binary", None);

        let err = cli
            .update_record("Account", "001000000000001", &Fields::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Invalid(_)));
    }
}
