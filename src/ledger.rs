use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder};

use crate::time_entry::{Category, TimeEntry, TimeEntryDraft};

/// タイムエントリーとカテゴリーを永続化しているリモートの台帳を表すtrait。
///
/// 失敗はすべて通信エラーとして扱い、構造化されたエラーコードは持たない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// 現在のユーザーが参照できるすべてのタイムエントリーを取得する。
    async fn fetch_time_entries(&self) -> Result<Vec<TimeEntry>>;

    /// タイムエントリーを作成し、IDとタイムスタンプが割り当てられたエントリーを返す。
    async fn create_time_entry(&self, draft: &TimeEntryDraft) -> Result<TimeEntry>;

    /// 既存のタイムエントリーを更新する。
    async fn update_time_entry(&self, id: &str, draft: &TimeEntryDraft) -> Result<TimeEntry>;

    /// タイムエントリーを削除する。
    async fn delete_time_entry(&self, id: &str) -> Result<()>;

    /// ユーザーのカテゴリー一覧を取得する。
    async fn fetch_categories(&self) -> Result<Vec<Category>>;
}

/// 台帳APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = LedgerClient::new("http://localhost:3000/api", None).unwrap();
/// let time_entries = client.fetch_time_entries().await.unwrap();
/// ```
pub struct LedgerClient {
    client: Client,
    api_url: String,
    api_token: Option<String>,
}

impl LedgerClient {
    /// 新しい`LedgerClient`を返す。
    ///
    /// # Arguments
    ///
    /// * `api_url` - APIのベースURL。末尾の`/`は取り除かれる。
    /// * `api_token` - 指定された場合はBearerトークンとして送信する
    pub fn new(api_url: &str, api_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    /// 認証情報とヘッダーを付与する。
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(CONTENT_TYPE, "application/json");
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn entry_url(&self, id: &str) -> String {
        format!("{}/time-entries/{}", self.api_url, id)
    }
}

#[async_trait]
impl LedgerRepository for LedgerClient {
    async fn fetch_time_entries(&self) -> Result<Vec<TimeEntry>> {
        let time_entries = self
            .authorize(self.client.get(format!("{}/time-entries", self.api_url)))
            .send()
            .await
            .with_context(|| format!("Failed to send request to ledger API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<Vec<TimeEntry>>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of time entries: {}", time_entries.len());

        Ok(time_entries)
    }

    async fn create_time_entry(&self, draft: &TimeEntryDraft) -> Result<TimeEntry> {
        let time_entry = self
            .authorize(self.client.post(format!("{}/time-entries", self.api_url)))
            .json(draft)
            .send()
            .await
            .with_context(|| format!("Failed to send request to ledger API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<TimeEntry>()
            .await
            .context("Failed to deserialize response")?;
        debug!("Created time entry: {}", time_entry.id);

        Ok(time_entry)
    }

    async fn update_time_entry(&self, id: &str, draft: &TimeEntryDraft) -> Result<TimeEntry> {
        let time_entry = self
            .authorize(self.client.put(self.entry_url(id)))
            .json(draft)
            .send()
            .await
            .with_context(|| format!("Failed to send request to ledger API at {}", self.api_url))?
            .error_for_status()
            .with_context(|| format!("Failed to update time entry: {}", id))?
            .json::<TimeEntry>()
            .await
            .context("Failed to deserialize response")?;
        debug!("Updated time entry: {}", time_entry.id);

        Ok(time_entry)
    }

    async fn delete_time_entry(&self, id: &str) -> Result<()> {
        self.authorize(self.client.delete(self.entry_url(id)))
            .send()
            .await
            .with_context(|| format!("Failed to send request to ledger API at {}", self.api_url))?
            .error_for_status()
            .with_context(|| format!("Failed to delete time entry: {}", id))?;
        debug!("Deleted time entry: {}", id);

        Ok(())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .authorize(self.client.get(format!("{}/categories", self.api_url)))
            .send()
            .await
            .with_context(|| format!("Failed to send request to ledger API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<Vec<Category>>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of categories: {}", categories.len());

        Ok(categories)
    }
}
