/// Affiliate id format checks
use crate::link_data::AffiliateSettings;
use crate::programs::{AffiliateProgram, IdFormat, ProgramRegistry};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    pub suggestion: Option<String>,
}

static ASSOCIATE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+-[0-9]{2}$").expect("associate tag pattern is valid"));

static NUMERIC_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("numeric id pattern is valid"));

static SLUG_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("slug id pattern is valid"));

/// Blank ids are valid: the program is simply left unconfigured.
pub fn validate_affiliate_id(program: &AffiliateProgram, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Ok(());
    }

    let (valid, suggestion) = match program.id_format {
        IdFormat::AssociateTag => (
            ASSOCIATE_TAG.is_match(id),
            "Should end with country code like '-20' (e.g., yourname-20)",
        ),
        IdFormat::Numeric => (
            NUMERIC_ID.is_match(id),
            "Should be numeric (e.g., 812345)",
        ),
        IdFormat::Slug => (
            SLUG_ID.is_match(id),
            "Should contain only letters, numbers, underscores, and hyphens",
        ),
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError {
            message: format!("Invalid {} ID format", program.name),
            suggestion: Some(suggestion.to_string()),
        })
    }
}

/// Validate every entry, keyed by program id. Unknown programs are errors.
pub fn validate_settings(
    registry: &ProgramRegistry,
    settings: &AffiliateSettings,
) -> BTreeMap<String, Result<(), ValidationError>> {
    settings
        .iter()
        .map(|(program_id, id)| {
            let result = match registry.find_by_id(program_id) {
                Some(program) => validate_affiliate_id(program, id),
                None => Err(ValidationError {
                    message: format!("Unknown affiliate program: {}", program_id),
                    suggestion: None,
                }),
            };
            (program_id.to_string(), result)
        })
        .collect()
}
