/// Privileged-context message handling: settings, conversion and history
use crate::config::DEFAULT_RECENT_LIMIT;
use crate::converter::LinkConverter;
use crate::link_data::{AffiliateSettings, User, UserStatus};
use crate::messaging::{MessageChannel, MessageError, Request, Response, ResponseData, SettingsSnapshot};
use crate::programs::ProgramRegistry;
use crate::stats::ConversionStats;
use crate::storage::{StorageBackend, StorageData, StorageError};
use crate::validation::validate_settings;
use futures::future::{FutureExt, LocalBoxFuture};
use futures::lock::Mutex;
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid affiliate settings: {0}")]
    InvalidSettings(String),
}

pub struct Background<S> {
    registry: Rc<ProgramRegistry>,
    storage: S,
    /// Held from load through save so concurrent handlers cannot drop each other's writes
    write_lock: Mutex<()>,
    clock: Box<dyn Fn() -> f64>,
}

impl<S: StorageBackend> Background<S> {
    pub fn new(registry: Rc<ProgramRegistry>, storage: S, clock: impl Fn() -> f64 + 'static) -> Self {
        Background {
            registry,
            storage,
            write_lock: Mutex::new(()),
            clock: Box::new(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    /// Entry point for raw messages; anything that is not a known request is rejected
    pub async fn handle_value(&self, message: serde_json::Value) -> Response {
        match serde_json::from_value::<Request>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Rejected message: {}", e);
                Response::error("Unknown action")
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Background handler error: {}", e);
                Response::error(e.to_string())
            }
        }
    }

    /// Called by the auth collaborator on sign-in (`Some`) and sign-out (`None`)
    pub async fn set_user(&self, user: Option<User>) -> Result<(), BackgroundError> {
        self.modify(|data| data.user = user).await
    }

    /// Load, change and save the stored record as one step
    async fn modify<T>(&self, change: impl FnOnce(&mut StorageData) -> T) -> Result<T, BackgroundError> {
        let _guard = self.write_lock.lock().await;
        let mut data = self.storage.load().await?;
        let output = change(&mut data);
        self.storage.save(&data).await?;
        Ok(output)
    }

    async fn dispatch(&self, request: Request) -> Result<Response, BackgroundError> {
        match request {
            Request::GetSettings => {
                let data = self.storage.load().await?;
                Ok(Response::with_data(ResponseData::Settings(SettingsSnapshot {
                    is_enabled: data.is_enabled,
                    affiliate_settings: data.effective_settings().clone(),
                })))
            }

            Request::UpdateSettings { settings } => {
                let settings = self.checked_settings(settings)?;
                let now = (self.clock)();
                self.modify(|data| data.update_settings(settings, now)).await?;
                log::info!("Affiliate settings updated");
                Ok(Response::ok())
            }

            Request::ToggleEnabled { enabled } => {
                self.modify(|data| data.is_enabled = enabled).await?;
                Ok(Response::ok())
            }

            Request::ConvertUrl { url } => {
                let data = self.storage.load().await?;
                let converter = LinkConverter::new(&self.registry, data.effective_settings().clone());
                Ok(Response::from(converter.convert(&url)))
            }

            Request::LogConversion { conversion } => {
                log::info!("Converted {} link on {}", conversion.program, conversion.domain);
                self.modify(|data| data.add_conversion(conversion)).await?;
                Ok(Response::ok())
            }

            Request::GetUserStatus => {
                let data = self.storage.load().await?;
                Ok(Response {
                    user: data.user.as_ref().map(UserStatus::from),
                    ..Response::ok()
                })
            }

            Request::GetRecentConversions { limit } => {
                let data = self.storage.load().await?;
                let recent = data.recent_conversions(limit.unwrap_or(DEFAULT_RECENT_LIMIT));
                Ok(Response::with_data(ResponseData::Conversions(recent)))
            }

            Request::GetConversionStats => {
                let data = self.storage.load().await?;
                let stats = ConversionStats::from_conversions(&data.conversions, (self.clock)());
                Ok(Response::with_data(ResponseData::Stats(stats)))
            }
        }
    }

    /// Drop blank entries, then reject unknown programs and malformed ids
    fn checked_settings(&self, settings: AffiliateSettings) -> Result<AffiliateSettings, BackgroundError> {
        let cleaned: AffiliateSettings = settings
            .iter()
            .filter(|(_, id)| !id.trim().is_empty())
            .map(|(program_id, id)| (program_id, id.trim()))
            .collect();

        let problems: Vec<String> = validate_settings(&self.registry, &cleaned)
            .into_iter()
            .filter_map(|(program_id, result)| result.err().map(|e| format!("{}: {}", program_id, e)))
            .collect();

        if problems.is_empty() {
            Ok(cleaned)
        } else {
            Err(BackgroundError::InvalidSettings(problems.join("; ")))
        }
    }
}

/// Loopback channel for callers living in the background context itself
impl<S: StorageBackend> MessageChannel for Background<S> {
    fn send(&self, request: Request) -> LocalBoxFuture<'_, Result<Response, MessageError>> {
        async move { Ok::<_, MessageError>(self.handle(request).await) }.boxed_local()
    }
}
