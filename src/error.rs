use chrono::{DateTime, Utc};
use thiserror::Error;

/// `TimeEntryStore`の操作で発生するエラー。
///
/// 検証エラー(`InvalidRange`, `UnknownCategory`, `Overlap`)はリモート呼び出しの前に検出される。
/// それ以外はリモート呼び出しの失敗をそのまま保持する。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("End time {end} must be after start time {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Time slot {start} ~ {end} overlaps with an existing entry")]
    Overlap {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Failed to fetch from the ledger")]
    Fetch(#[source] anyhow::Error),

    #[error("Failed to create time entry")]
    Create(#[source] anyhow::Error),

    #[error("Failed to update time entry")]
    Update(#[source] anyhow::Error),

    #[error("Failed to delete time entry")]
    Delete(#[source] anyhow::Error),
}

impl StoreError {
    /// リモート呼び出しを行わずに検出されたエラーであれば`true`を返す。
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRange { .. } | Self::UnknownCategory(_) | Self::Overlap { .. }
        )
    }
}
