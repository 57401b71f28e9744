use chrono::{DateTime, Utc};

use crate::time_entry::TimeEntry;

/// 指定された区間が既存のタイムエントリーと重なるかを判定する。
///
/// 区間は`[start, end)`として扱い、境界が接しているだけの場合は重なりとみなさない。
/// `end <= start`の区間はどのエントリーとも重ならないものとして`false`を返す。
///
/// # Arguments
///
/// * `entries` - 比較対象のタイムエントリー
/// * `start` - 判定する区間の開始日時
/// * `end` - 判定する区間の終了日時
/// * `exclude_id` - 判定から除外するタイムエントリーのID(更新中のエントリー自身)
pub fn has_overlap(
    entries: &[TimeEntry],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude_id: Option<&str>,
) -> bool {
    if end <= start {
        return false;
    }

    entries
        .iter()
        .filter(|entry| Some(entry.id.as_str()) != exclude_id)
        .any(|entry| entry.start_time < end && start < entry.end_time)
}
