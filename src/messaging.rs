/// Typed request/response contract between the page and the background context
use crate::converter::ConversionResult;
use crate::link_data::{AffiliateSettings, LinkConversion, UserStatus};
use crate::stats::ConversionStats;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MessageError {
    #[error("Message transport failed: {0}")]
    Transport(String),

    #[error("Failed to (de)serialize message: {0}")]
    Serialization(String),

    #[error("No response from background")]
    NoResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetSettings,
    UpdateSettings {
        settings: AffiliateSettings,
    },
    ToggleEnabled {
        enabled: bool,
    },
    ConvertUrl {
        url: String,
    },
    LogConversion {
        conversion: LinkConversion,
    },
    GetUserStatus,
    GetRecentConversions {
        #[serde(default)]
        limit: Option<usize>,
    },
    GetConversionStats,
}

/// Enabled flag plus the settings currently in effect
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub is_enabled: bool,
    pub affiliate_settings: AffiliateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseData {
    Settings(SettingsSnapshot),
    Conversions(Vec<LinkConversion>),
    Stats(ConversionStats),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response {
            success: true,
            ..Default::default()
        }
    }

    pub fn with_data(data: ResponseData) -> Self {
        Response {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response {
            success: false,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn settings(&self) -> Option<&SettingsSnapshot> {
        match &self.data {
            Some(ResponseData::Settings(snapshot)) => Some(snapshot),
            _ => None,
        }
    }
}

impl From<ConversionResult> for Response {
    fn from(result: ConversionResult) -> Self {
        Response {
            success: result.success,
            error: result.error,
            original_url: Some(result.original_url),
            affiliate_url: result.affiliate_url,
            program: result.program,
            ..Default::default()
        }
    }
}

/// Fire-and-respond channel to the privileged context
pub trait MessageChannel {
    fn send(&self, request: Request) -> LocalBoxFuture<'_, Result<Response, MessageError>>;
}
