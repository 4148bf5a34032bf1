/// Data structures for Link Monetizer
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Per-program affiliate ids, keyed by program id
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AffiliateSettings(BTreeMap<String, String>);

impl AffiliateSettings {
    pub fn new() -> Self {
        AffiliateSettings(BTreeMap::new())
    }

    /// The configured id for a program, treating blank values as unset
    pub fn affiliate_id(&self, program_id: &str) -> Option<&str> {
        self.0
            .get(program_id)
            .map(|id| id.as_str())
            .filter(|id| !id.trim().is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AffiliateSettings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AffiliateSettings(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A completed link rewrite, kept for history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkConversion {
    pub id: String,
    pub original_url: String,
    pub affiliate_url: String,
    pub program: String,
    pub timestamp: f64,
    pub domain: String,
}

impl LinkConversion {
    pub fn new(
        original_url: String,
        affiliate_url: String,
        program: String,
        timestamp: f64,
        domain: String,
    ) -> LinkConversion {
        LinkConversion {
            id: Uuid::new_v4().to_string(),
            original_url,
            affiliate_url,
            program,
            timestamp,
            domain,
        }
    }
}

/// Signed-in user record, supplied by the auth collaborator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub affiliate_settings: AffiliateSettings,
    #[serde(default)]
    pub is_pro: bool,
    pub created_at: f64,
}

/// The subset of `User` exposed to the page and popup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub uid: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub is_pro: bool,
}

impl From<&User> for UserStatus {
    fn from(user: &User) -> Self {
        UserStatus {
            uid: user.uid.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_pro: user.is_pro,
        }
    }
}
