/// Generic record-management backend
///
/// The backend exposes CRUD over named tables. Reads take an explicit field
/// list plus conditions; writes take batches and report success per record.
/// Failures arrive as a `{success: false, message}` envelope instead of an
/// HTTP error, so implementations translate them into `AppError::Remote`.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub mod codec;
pub mod http;

pub use http::HttpRecordStore;

/// A raw backend record, keyed by field name
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Operator {
    EqualTo,
    Contains,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub sort_type: SortDirection,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Paging {
    pub limit: usize,
    pub offset: usize,
}

/// Fetch request: which fields, which rows, in which order
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub fields: Vec<String>,
    #[serde(rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<Paging>,
}

impl RecordQuery {
    pub fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn filter(mut self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition {
            field_name: field.to_string(),
            operator,
            values: vec![value.into()],
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.to_string(),
            sort_type: direction,
        });
        self
    }

    pub fn paging(mut self, limit: usize, offset: usize) -> Self {
        self.paging_info = Some(Paging { limit, offset });
        self
    }
}

/// Per-record result of a batch write
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RecordOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Record>,
}

/// Remote record store contract
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all records of a table matching the query
    async fn fetch_records(&self, table: &str, query: RecordQuery) -> AppResult<Vec<Record>>;

    /// Fetch a single record, `None` when the id does not exist
    async fn get_record_by_id(
        &self,
        table: &str,
        id: i64,
        fields: Vec<String>,
    ) -> AppResult<Option<Record>>;

    async fn create_records(&self, table: &str, records: Vec<Record>)
        -> AppResult<Vec<RecordOutcome>>;

    /// Each record must carry its `Id`
    async fn update_records(&self, table: &str, records: Vec<Record>)
        -> AppResult<Vec<RecordOutcome>>;

    async fn delete_records(&self, table: &str, ids: Vec<i64>) -> AppResult<Vec<RecordOutcome>>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Splits a batch into successes and logged failures
///
/// Each record succeeds or fails on its own. A batch where nothing
/// succeeded is an error; otherwise the successful records are returned.
pub fn successful_records(
    table: &str,
    operation: &str,
    outcomes: Vec<RecordOutcome>,
) -> AppResult<Vec<Record>> {
    let total = outcomes.len();
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        if outcome.success {
            records.push(outcome.data.unwrap_or_default());
        } else {
            let message = outcome
                .message
                .unwrap_or_else(|| "unknown failure".to_string());
            tracing::error!(
                table = %table,
                operation = %operation,
                message = %message,
                "Record operation failed"
            );
            failures.push(message);
        }
    }

    if !failures.is_empty() {
        tracing::warn!(
            table = %table,
            operation = %operation,
            success_count = records.len(),
            error_count = failures.len(),
            "Partial batch failure"
        );
    }

    if records.is_empty() && total > 0 {
        return Err(AppError::Remote(format!(
            "Failed to {} {} records: {}",
            operation,
            table,
            failures.join("; ")
        )));
    }

    Ok(records)
}

/// First successful record of a single-record batch
pub fn single_record(table: &str, operation: &str, outcomes: Vec<RecordOutcome>) -> AppResult<Record> {
    successful_records(table, operation, outcomes)?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Remote(format!("Empty {} response for {}", operation, table)))
}

/// Overlays `changes` onto `base`, field by field
///
/// Update echoes may carry only the changed fields, so the stored entity is
/// rebuilt from the record read before the write plus what was sent and
/// echoed.
pub fn merge_records(mut base: Record, changes: Record) -> Record {
    base.extend(changes);
    base
}

/// Builds a record from `(field, value)` pairs
pub fn record_from<I>(fields: I) -> Record
where
    I: IntoIterator<Item = (&'static str, Value)>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
