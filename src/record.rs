//! Record shapes: the encrypted row, the aggregate plaintext, and the
//! decrypted views handed back to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::index::BlindIndexValue;
use crate::storage::StorageCiphertext;

/// Maximum identifier length in characters, after normalisation.
pub const MAX_IDENTIFIER_LEN: usize = 20;

/// Maximum name length in characters, after trimming.
pub const MAX_NAME_LEN: usize = 255;

/// A stored row. Only ciphertexts, the blind index and metadata; no
/// plaintext or key material ever lands here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: String,
    pub encrypted_identifier: StorageCiphertext,
    pub encrypted_name: StorageCiphertext,
    /// The whole [`RecordPayload`] sealed as one blob, so reads need one decrypt.
    pub encrypted_aggregate: StorageCiphertext,
    pub blind_index: BlindIndexValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The plaintext sealed into `encrypted_aggregate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub extra: Option<Value>,
}

/// A decrypted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub id: String,
    pub identifier: String,
    pub name: String,
    pub extra: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Fields a client sends inside an envelope.
///
/// The original field names `national_id` and `additional_data` are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngressData {
    #[serde(alias = "national_id")]
    pub identifier: String,
    pub name: String,
    #[serde(default, alias = "additional_data")]
    pub extra: Option<Value>,
}

/// Result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressReceipt {
    pub success: bool,
    pub message: String,
    pub record_id: Option<String>,
}

impl IngressReceipt {
    pub(crate) fn stored(record_id: String) -> Self {
        Self {
            success: true,
            message: "Data received and stored securely".to_string(),
            record_id: Some(record_id),
        }
    }
}

/// Search result. A miss is `found: false` with every other field empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Option<RecordView>> for SearchResponse {
    fn from(view: Option<RecordView>) -> Self {
        match view {
            Some(view) => Self {
                found: true,
                identifier: Some(view.identifier),
                name: Some(view.name),
                extra: view.extra,
                created_at: Some(view.created_at),
            },
            None => Self::default(),
        }
    }
}

/// Administrative listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordListing {
    pub records: Vec<RecordView>,
    pub count: usize,
}

impl From<Vec<RecordView>> for RecordListing {
    fn from(records: Vec<RecordView>) -> Self {
        let count = records.len();
        Self { records, count }
    }
}
