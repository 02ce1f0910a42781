use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-change envelope delivered to the dispatcher.
///
/// Wire shape: `{ "type": "INSERT" | "UPDATE", "table": ..., "record": {...},
/// "old_record": {...} | null }`. `table` is optional; when absent the
/// dispatcher infers the source table from the record's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default)]
    pub record: Option<serde_json::Value>,
    #[serde(default)]
    pub old_record: Option<serde_json::Value>,
}

impl ChangeEvent {
    /// Build an `INSERT` event for a freshly written row.
    pub fn insert<T: Serialize>(table: &str, record: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ChangeKind::Insert,
            table: Some(table.to_string()),
            record: Some(serde_json::to_value(record)?),
            old_record: None,
        })
    }

    /// Build an `UPDATE` event carrying the prior and the new row.
    pub fn update<T: Serialize>(
        table: &str,
        record: &T,
        old_record: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: ChangeKind::Update,
            table: Some(table.to_string()),
            record: Some(serde_json::to_value(record)?),
            old_record: Some(serde_json::to_value(old_record)?),
        })
    }

    /// Decode the new row into a typed record.
    pub fn record_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.record
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Decode the prior row into a typed record.
    pub fn old_record_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.old_record
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
