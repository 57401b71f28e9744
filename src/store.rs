use chrono::{Local, NaiveDate, TimeZone};
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::ledger::LedgerRepository;
use crate::overlap::has_overlap;
use crate::time_entry::{Category, TimeEntry, TimeEntryDraft};

/// 購読者が取りこぼしを許容できるイベント数。
const EVENT_CAPACITY: usize = 64;

/// スナップショットが変更されたときに通知されるイベント。
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    EntriesLoaded,
    CategoriesLoaded,
    EntryCreated(TimeEntry),
    EntryUpdated(TimeEntry),
    EntryDeleted(String),
}

/// 現在のセッションで扱うタイムエントリーとカテゴリーのスナップショットを保持する。
///
/// 変更系の操作はすべて検証を通過した後にリモートの台帳へ委譲する。
/// スナップショットは一時的なコピーであり、正は台帳側にある。
pub struct TimeEntryStore<R: LedgerRepository> {
    repository: R,
    entries: Vec<TimeEntry>,
    categories: Vec<Category>,
    events: broadcast::Sender<StoreEvent>,
}

impl<R: LedgerRepository> TimeEntryStore<R> {
    /// 空のスナップショットを持つ`TimeEntryStore`を返す。
    ///
    /// # Arguments
    ///
    /// * `repository` - リモートの台帳と通信するためのリポジトリ
    pub fn new(repository: R) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            repository,
            entries: Vec::new(),
            categories: Vec::new(),
            events,
        }
    }

    /// スナップショットの変更を購読する。
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// 台帳からタイムエントリーを取得し、スナップショットを置き換える。
    ///
    /// 取得に失敗した場合、スナップショットは変更しない。
    pub async fn load_entries(&mut self) -> Result<&[TimeEntry], StoreError> {
        let entries = self
            .repository
            .fetch_time_entries()
            .await
            .map_err(StoreError::Fetch)?;
        info!("Loaded {} time entries", entries.len());

        self.entries = entries;
        self.publish(StoreEvent::EntriesLoaded);
        Ok(&self.entries)
    }

    /// 台帳からカテゴリーを取得し、スナップショットを置き換える。
    pub async fn load_categories(&mut self) -> Result<&[Category], StoreError> {
        let categories = self
            .repository
            .fetch_categories()
            .await
            .map_err(StoreError::Fetch)?;
        info!("Loaded {} categories", categories.len());

        self.categories = categories;
        self.publish(StoreEvent::CategoriesLoaded);
        Ok(&self.categories)
    }

    /// タイムエントリーを作成する。
    ///
    /// 検証に失敗した場合は台帳を呼び出さず、スナップショットも変更しない。
    /// 成功した場合はサーバーが返したエントリーをスナップショットに追加する。
    pub async fn create_entry(&mut self, draft: TimeEntryDraft) -> Result<TimeEntry, StoreError> {
        self.validate(&draft, None)?;

        let entry = self
            .repository
            .create_time_entry(&draft)
            .await
            .map_err(StoreError::Create)?;
        info!("Created time entry {}: {}", entry.id, entry.title);

        self.entries.push(entry.clone());
        self.publish(StoreEvent::EntryCreated(entry.clone()));
        Ok(entry)
    }

    /// タイムエントリーを更新する。
    ///
    /// 重なりの判定では更新対象のエントリー自身を除外する。
    /// 更新後はサーバーの状態と一致させるため、すべてのエントリーを再取得する。
    pub async fn update_entry(
        &mut self,
        id: &str,
        draft: TimeEntryDraft,
    ) -> Result<TimeEntry, StoreError> {
        self.validate(&draft, Some(id))?;

        let entry = self
            .repository
            .update_time_entry(id, &draft)
            .await
            .map_err(StoreError::Update)?;
        info!("Updated time entry {}", entry.id);

        self.load_entries().await?;
        self.publish(StoreEvent::EntryUpdated(entry.clone()));
        Ok(entry)
    }

    /// タイムエントリーを削除する。
    ///
    /// 台帳での削除に成功した場合のみスナップショットから取り除く。
    pub async fn delete_entry(&mut self, id: &str) -> Result<(), StoreError> {
        self.repository
            .delete_time_entry(id)
            .await
            .map_err(StoreError::Delete)?;
        info!("Deleted time entry {}", id);

        self.entries.retain(|entry| entry.id != id);
        self.publish(StoreEvent::EntryDeleted(id.to_string()));
        Ok(())
    }

    /// Localタイムゾーンで指定された日に開始したタイムエントリーを返す。
    pub fn entries_for_day(&self, day: NaiveDate) -> Vec<TimeEntry> {
        self.entries_for_day_in(day, &Local)
    }

    /// 指定されたタイムゾーンで指定された日に開始したタイムエントリーを返す。
    pub fn entries_for_day_in<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> Vec<TimeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.start_time.with_timezone(tz).date_naive() == day)
            .cloned()
            .collect()
    }

    /// Localタイムゾーンで開始日が`from`から`to`まで(両端を含む)のタイムエントリーを返す。
    pub fn entries_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<TimeEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                let day = entry.start_time.with_timezone(&Local).date_naive();
                from <= day && day <= to
            })
            .cloned()
            .collect()
    }

    /// 作成・更新前の検証を行う。
    fn validate(&self, draft: &TimeEntryDraft, exclude_id: Option<&str>) -> Result<(), StoreError> {
        if draft.end_time <= draft.start_time {
            return Err(StoreError::InvalidRange {
                start: draft.start_time,
                end: draft.end_time,
            });
        }

        if self.category(&draft.category_id).is_none() {
            return Err(StoreError::UnknownCategory(draft.category_id.clone()));
        }

        if has_overlap(&self.entries, draft.start_time, draft.end_time, exclude_id) {
            warn!(
                "Time slot {} ~ {} overlaps with an existing entry",
                draft.start_time, draft.end_time
            );
            return Err(StoreError::Overlap {
                start: draft.start_time,
                end: draft.end_time,
            });
        }

        Ok(())
    }

    fn publish(&self, event: StoreEvent) {
        // 購読者がいない場合の送信エラーは無視する
        if self.events.send(event).is_err() {
            debug!("No subscribers for store event");
        }
    }
}
