/// Persisted extension state and the backends that hold it
use crate::config::HISTORY_LIMIT;
use crate::link_data::{AffiliateSettings, LinkConversion, User};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend failed: {0}")]
    Backend(String),

    #[error("Failed to (de)serialize storage: {0}")]
    Serialization(String),
}

/// Root storage structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageData {
    #[serde(default = "enabled_by_default")]
    pub is_enabled: bool,
    /// Local copy of the settings, used when nobody is signed in
    #[serde(default)]
    pub affiliate_settings: AffiliateSettings,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub conversions: Vec<LinkConversion>,
    #[serde(default)]
    pub last_sync: f64,
}

fn enabled_by_default() -> bool {
    true
}

impl StorageData {
    pub fn new() -> Self {
        StorageData {
            is_enabled: true,
            affiliate_settings: AffiliateSettings::new(),
            user: None,
            conversions: Vec::new(),
            last_sync: 0.0,
        }
    }

    /// Settings in effect: the signed-in user's, else the local copy
    pub fn effective_settings(&self) -> &AffiliateSettings {
        match &self.user {
            Some(user) => &user.affiliate_settings,
            None => &self.affiliate_settings,
        }
    }

    /// Last write wins; the local copy is always kept as a backup
    pub fn update_settings(&mut self, settings: AffiliateSettings, now: f64) {
        if let Some(user) = self.user.as_mut() {
            user.affiliate_settings = settings.clone();
        }
        self.affiliate_settings = settings;
        self.last_sync = now;
    }

    pub fn add_conversion(&mut self, conversion: LinkConversion) {
        self.conversions.push(conversion);
        if self.conversions.len() > HISTORY_LIMIT {
            let excess = self.conversions.len() - HISTORY_LIMIT;
            self.conversions.drain(..excess);
        }
    }

    /// Newest first, at most `limit` entries
    pub fn recent_conversions(&self, limit: usize) -> Vec<LinkConversion> {
        let mut conversions = self.conversions.clone();
        conversions.sort_by(|a, b| b.timestamp.total_cmp(&a.timestamp));
        conversions.truncate(limit);
        conversions
    }
}

impl Default for StorageData {
    fn default() -> Self {
        Self::new()
    }
}

/// Where `StorageData` lives between messages
pub trait StorageBackend {
    fn load(&self) -> LocalBoxFuture<'_, Result<StorageData, StorageError>>;

    fn save<'a>(&'a self, data: &'a StorageData) -> LocalBoxFuture<'a, Result<(), StorageError>>;
}

/// Process-local backend, used in tests and when extension storage is unavailable
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RefCell<StorageData>,
}

impl MemoryStorage {
    pub fn new(data: StorageData) -> Self {
        MemoryStorage {
            data: RefCell::new(data),
        }
    }

    pub fn snapshot(&self) -> StorageData {
        self.data.borrow().clone()
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> LocalBoxFuture<'_, Result<StorageData, StorageError>> {
        let data = self.data.borrow().clone();
        async move { Ok::<_, StorageError>(data) }.boxed_local()
    }

    fn save<'a>(&'a self, data: &'a StorageData) -> LocalBoxFuture<'a, Result<(), StorageError>> {
        *self.data.borrow_mut() = data.clone();
        async { Ok::<_, StorageError>(()) }.boxed_local()
    }
}
