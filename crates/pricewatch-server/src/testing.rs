//! In-memory collaborators for exercising the watch cycle and the dialog.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use pricewatch_core::{
    NotificationRecord, PayloadFormat, PreferenceStore, StoreError, Subscription, Target, UserId,
};
use pricewatch_scraper::{ExtractContext, ListingSource, RawResponse, ScraperError};
use rust_decimal::Decimal;
use tokio::sync::Notify;

use crate::notify::{NotifyError, Notifier};

pub const SITE: &str = "https://www.wildberries.ru";

pub fn extract_context() -> ExtractContext {
    ExtractContext {
        site_url: SITE.to_string(),
        max_entries: 20,
    }
}

pub fn json_response(body: &str) -> RawResponse {
    RawResponse {
        status: 200,
        body: body.to_string(),
        content_type: Some("application/json; charset=utf-8".to_string()),
        expected: PayloadFormat::Json,
    }
}

/// Catalog payload with Laptop A at 48000 and Laptop B at 55000.
pub fn laptops() -> RawResponse {
    json_response(
        r#"{"data":{"products":[
            {"id":1,"name":"Laptop A","priceU":6000000,"salePriceU":4800000},
            {"id":2,"name":"Laptop B","priceU":5500000,"salePriceU":5500000}
        ]}}"#,
    )
}

pub fn challenge_page() -> RawResponse {
    RawResponse {
        status: 200,
        body: "<html><head><title>Почти готово...</title></head>\
               <body><div id=\"challenge-form\">Checking your browser</div></body></html>"
            .to_string(),
        content_type: Some("text/html".to_string()),
        expected: PayloadFormat::Json,
    }
}

pub enum Reply {
    Raw(RawResponse),
    NetworkDown,
    Panic,
    /// Signals `entered`, then waits for `release` before answering.
    Hold {
        entered: Arc<Notify>,
        release: Arc<Notify>,
        then: RawResponse,
    },
}

/// Answers each target with a fixed reply and counts fetches.
#[derive(Default)]
pub struct ScriptedSource {
    replies: HashMap<Target, Reply>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    pub fn with(mut self, target: Target, reply: Reply) -> Self {
        self.replies.insert(target, reply);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

/// A genuine connection-refused error from a port nobody listens on.
pub async fn connection_refused() -> ScraperError {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr")
    };
    let err = reqwest::Client::new()
        .get(format!("http://{addr}/"))
        .send()
        .await
        .expect_err("nothing listens on a dropped port");
    ScraperError::Http(err)
}

#[async_trait::async_trait]
impl ListingSource for ScriptedSource {
    async fn fetch(&self, target: &Target) -> Result<RawResponse, ScraperError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(target) {
            Some(Reply::Raw(raw)) => Ok(raw.clone()),
            Some(Reply::NetworkDown) => Err(connection_refused().await),
            Some(Reply::Panic) => panic!("scripted panic for {target}"),
            Some(Reply::Hold {
                entered,
                release,
                then,
            }) => {
                entered.notify_one();
                release.notified().await;
                Ok(then.clone())
            }
            None => Err(ScraperError::UnknownCategory(0)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    subscriptions: Mutex<BTreeMap<UserId, Subscription>>,
    notifications: Mutex<Vec<NotificationRecord>>,
    checks: Mutex<Vec<UserId>>,
    unavailable: bool,
}

impl MemoryStore {
    /// A store whose subscription listing always fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn with(self, user_id: UserId, target: Target, threshold: i64) -> Self {
        let sub = Subscription::new(user_id, target, Decimal::from(threshold)).expect("valid");
        self.subscriptions
            .lock()
            .expect("lock")
            .insert(user_id, sub);
        self
    }

    pub fn notified_users(&self) -> Vec<UserId> {
        self.notifications
            .lock()
            .expect("lock")
            .iter()
            .map(|r| r.user_id)
            .collect()
    }

    pub fn checked_users(&self) -> Vec<UserId> {
        let mut users = self.checks.lock().expect("lock").clone();
        users.sort_unstable();
        users
    }

    pub fn subscription(&self, user_id: UserId) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .expect("lock")
            .get(&user_id)
            .cloned()
    }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryStore {
    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Backend("store offline".into()));
        }
        Ok(self
            .subscriptions
            .lock()
            .expect("lock")
            .values()
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Subscription>, StoreError> {
        Ok(self.subscription(user_id))
    }

    async fn upsert(
        &self,
        user_id: UserId,
        target: Target,
        threshold: Decimal,
    ) -> Result<Subscription, StoreError> {
        let sub = Subscription::new(user_id, target, threshold).map_err(|e| {
            StoreError::InvalidRecord {
                user_id,
                reason: e.to_string(),
            }
        })?;
        self.subscriptions
            .lock()
            .expect("lock")
            .insert(user_id, sub.clone());
        Ok(sub)
    }

    async fn remove(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .subscriptions
            .lock()
            .expect("lock")
            .remove(&user_id)
            .is_some())
    }

    async fn record_notification(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        self.notifications
            .lock()
            .expect("lock")
            .push(record.clone());
        Ok(())
    }

    async fn record_check(
        &self,
        user_id: UserId,
        _checked_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.checks.lock().expect("lock").push(user_id);
        Ok(())
    }
}

/// Collects sent messages; users in `blocked` reject delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(UserId, String)>>,
    blocked: HashSet<UserId>,
}

impl RecordingNotifier {
    /// Makes delivery to `user_id` fail as if the user blocked the bot.
    pub fn blocking(mut self, user_id: UserId) -> Self {
        self.blocked.insert(user_id);
        self
    }

    pub fn sent(&self) -> Vec<(UserId, String)> {
        let mut sent = self.sent.lock().expect("lock").clone();
        sent.sort_by_key(|(user_id, _)| *user_id);
        sent
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, user_id: UserId, html: &str) -> Result<(), NotifyError> {
        if self.blocked.contains(&user_id) {
            return Err(NotifyError::Api {
                method: "sendMessage",
                code: Some(403),
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("lock")
            .push((user_id, html.to_string()));
        Ok(())
    }
}
