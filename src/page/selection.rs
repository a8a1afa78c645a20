//! Reply of the highlight scripts

use serde::Deserialize;
use serde_json::Value;

use crate::error::{ReaderError, Result};
use crate::geometry::Rect;
use crate::navigation::parse_rect;

/// One wrapped selection, as reported by `highlightString(…)`
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionReport {
    pub id: String,
    pub rect: Rect,
    pub start_offset: i64,
    pub end_offset: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    id: String,
    #[serde(default)]
    rect: String,
    start_offset: Option<Value>,
    end_offset: Option<Value>,
}

impl SelectionReport {
    /// Parse the script reply: a JSON array (or its string form) whose first
    /// entry describes the new highlight.
    pub fn from_script_result(value: &Value) -> Result<Self> {
        let reports: Vec<RawReport> = match value {
            Value::String(text) => serde_json::from_str(text)?,
            other => serde_json::from_value(other.clone())?,
        };

        let raw = reports
            .into_iter()
            .next()
            .ok_or_else(|| ReaderError::MalformedRecord("empty selection report".to_string()))?;

        let start_offset = raw.start_offset.as_ref().and_then(offset);
        let end_offset = raw.end_offset.as_ref().and_then(offset);
        let (Some(start_offset), Some(end_offset)) = (start_offset, end_offset) else {
            return Err(ReaderError::MalformedRecord(format!("selection {} has no offsets", raw.id)));
        };

        Ok(Self {
            rect: parse_rect(&raw.rect),
            id: raw.id,
            start_offset,
            end_offset,
        })
    }
}

/// Offsets arrive as numbers or numeric strings
fn offset(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
