/// Affiliate link rewriting
use crate::link_data::AffiliateSettings;
use crate::programs::{AffiliateProgram, ParamPlacement, ProgramRegistry};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Url, form_urlencoded};

/// Why a URL could not be converted. The `Display` text is shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid URL format")]
    InvalidUrl,

    #[error("No affiliate program found for this domain")]
    NoProgram,

    #[error("No affiliate ID configured for {program_name}")]
    MissingAffiliateId {
        program_id: String,
        program_name: String,
    },
}

/// Outcome of one conversion attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub success: bool,
    pub original_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliate_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn converted(original_url: &str, affiliate_url: String, program: &str) -> Self {
        ConversionResult {
            success: true,
            original_url: original_url.to_string(),
            affiliate_url: Some(affiliate_url),
            program: Some(program.to_string()),
            error: None,
        }
    }

    pub fn failed(original_url: &str, error: &ConversionError) -> Self {
        ConversionResult {
            success: false,
            original_url: original_url.to_string(),
            affiliate_url: None,
            program: None,
            error: Some(error.to_string()),
        }
    }
}

/// Rewrites URLs under a fixed settings snapshot
pub struct LinkConverter<'a> {
    registry: &'a ProgramRegistry,
    settings: AffiliateSettings,
}

impl<'a> LinkConverter<'a> {
    pub fn new(registry: &'a ProgramRegistry, settings: AffiliateSettings) -> Self {
        LinkConverter { registry, settings }
    }

    pub fn update_settings(&mut self, settings: AffiliateSettings) {
        self.settings = settings;
    }

    pub fn settings(&self) -> &AffiliateSettings {
        &self.settings
    }

    pub fn convert(&self, url: &str) -> ConversionResult {
        match self.try_convert(url) {
            Ok((affiliate_url, program)) => ConversionResult::converted(url, affiliate_url, &program.id),
            Err(error) => {
                log::debug!("Not converting {}: {}", url, error);
                ConversionResult::failed(url, &error)
            }
        }
    }

    /// Returns the rewritten URL and the matched program
    pub fn try_convert(&self, url: &str) -> Result<(String, &'a AffiliateProgram), ConversionError> {
        let parsed = Url::parse(url).map_err(|_| ConversionError::InvalidUrl)?;
        let program = self.program_for(&parsed).ok_or(ConversionError::NoProgram)?;

        let affiliate_id = self
            .settings
            .affiliate_id(&program.id)
            .ok_or_else(|| ConversionError::MissingAffiliateId {
                program_id: program.id.clone(),
                program_name: program.name.clone(),
            })?;

        Ok((build_affiliate_url(&parsed, program, affiliate_id), program))
    }

    /// True when the URL belongs to a known program and already carries its parameter
    pub fn is_affiliate_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        match self.program_for(&parsed) {
            Some(program) => parsed
                .query()
                .map(|query| query_segments(query).any(|segment| segment_has_key(segment, &program.param_name)))
                .unwrap_or(false),
            None => false,
        }
    }

    fn program_for(&self, url: &Url) -> Option<&'a AffiliateProgram> {
        let hostname = url.host_str()?.to_lowercase();
        self.registry.find_by_domain(&hostname)
    }
}

fn build_affiliate_url(url: &Url, program: &AffiliateProgram, affiliate_id: &str) -> String {
    let mut rewritten = url.clone();
    let query = set_query_param(url.query(), &program.param_name, affiliate_id, program.placement);
    rewritten.set_query(Some(&query));
    rewritten.into()
}

/// Write `name=value` into a raw query string, leaving other segments untouched
fn set_query_param(query: Option<&str>, name: &str, value: &str, placement: ParamPlacement) -> String {
    let pair = format!(
        "{}={}",
        form_urlencoded::byte_serialize(name.as_bytes()).collect::<String>(),
        form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>()
    );

    let mut segments: Vec<&str> = Vec::new();
    let mut placed = false;

    for segment in query_segments(query.unwrap_or("")) {
        if !segment_has_key(segment, name) {
            segments.push(segment);
            continue;
        }
        if placement == ParamPlacement::Replace && !placed {
            segments.push(&pair);
            placed = true;
        }
    }

    if !placed {
        segments.push(&pair);
    }

    segments.join("&")
}

fn query_segments(query: &str) -> impl Iterator<Item = &str> {
    query.split('&').filter(|segment| !segment.is_empty())
}

fn segment_has_key(segment: &str, name: &str) -> bool {
    let raw_key = segment.split('=').next().unwrap_or("");
    form_urlencoded::parse(raw_key.as_bytes())
        .next()
        .map(|(key, _)| key == name)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProgramRegistry {
        ProgramRegistry::builtin().unwrap()
    }

    fn settings(pairs: &[(&str, &str)]) -> AffiliateSettings {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_convert_amazon_product() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("amazon", "shop-20")]));

        let result = converter.convert("https://www.amazon.com/dp/B000");

        assert!(result.success);
        assert_eq!(result.affiliate_url.as_deref(), Some("https://www.amazon.com/dp/B000?tag=shop-20"));
        assert_eq!(result.program.as_deref(), Some("amazon"));
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_convert_missing_affiliate_id_names_program() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, AffiliateSettings::new());

        let result = converter.convert("https://ebay.com/itm/123");

        assert!(!result.success);
        assert_eq!(result.affiliate_url, None);
        assert!(result.error.unwrap().contains("eBay Partner Network"));
    }

    #[test]
    fn test_convert_blank_affiliate_id_is_missing() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("ebay", "  ")]));

        let err = converter.try_convert("https://ebay.com/itm/123").unwrap_err();
        assert_eq!(
            err,
            ConversionError::MissingAffiliateId {
                program_id: "ebay".to_string(),
                program_name: "eBay Partner Network".to_string(),
            }
        );
    }

    #[test]
    fn test_convert_invalid_url() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("amazon", "shop-20")]));

        let result = converter.convert("not a url");

        assert!(!result.success);
        assert_eq!(result.original_url, "not a url");
        assert_eq!(result.error.as_deref(), Some("Invalid URL format"));
    }

    #[test]
    fn test_convert_unknown_domain() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("amazon", "shop-20")]));

        let result = converter.convert("https://unknownshop.test/p");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("No affiliate program found for this domain"));
    }

    #[test]
    fn test_convert_replaces_existing_amazon_tag() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("amazon", "new-20")]));

        let result = converter.convert("https://amazon.com/x?tag=old");
        assert_eq!(result.affiliate_url.as_deref(), Some("https://amazon.com/x?tag=new-20"));

        let result = converter.convert("https://amazon.com/x?tag=a&ref=sr_1&tag=b");
        assert_eq!(result.affiliate_url.as_deref(), Some("https://amazon.com/x?ref=sr_1&tag=new-20"));
    }

    #[test]
    fn test_convert_is_idempotent() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("amazon", "shop-20"), ("ebay", "5338177094")]));

        for url in ["https://www.amazon.com/dp/B000?th=1", "https://www.ebay.com/itm/1?hash=item1&mkcid=1"] {
            let once = converter.convert(url).affiliate_url.unwrap();
            let twice = converter.convert(&once).affiliate_url.unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_convert_replace_keeps_parameter_position() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("ebay", "5338177094")]));

        let result = converter.convert("https://www.ebay.com/itm/1?campid=1&mkevt=1&campid=2#reviews");

        assert_eq!(
            result.affiliate_url.as_deref(),
            Some("https://www.ebay.com/itm/1?campid=5338177094&mkevt=1#reviews")
        );
    }

    #[test]
    fn test_convert_preserves_other_query_bytes() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("booking", "812345")]));

        let result = converter.convert("https://www.booking.com/hotel/fr/x.html?checkin=2024-05-01&q=a%20b+c&label=%E2%9C%93");

        assert_eq!(
            result.affiliate_url.as_deref(),
            Some("https://www.booking.com/hotel/fr/x.html?checkin=2024-05-01&q=a%20b+c&label=%E2%9C%93&aid=812345")
        );
    }

    #[test]
    fn test_convert_encodes_affiliate_id() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("target", "a b&c")]));

        let result = converter.convert("https://www.target.com/p/-/A-1");

        assert_eq!(result.affiliate_url.as_deref(), Some("https://www.target.com/p/-/A-1?afid=a+b%26c"));
    }

    #[test]
    fn test_convert_uses_registry_param_name() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, settings(&[("cj", "987654321"), ("flexoffers", "456789")]));

        assert_eq!(
            converter.convert("https://www.tkqlhce.com/click-1").affiliate_url.as_deref(),
            Some("https://www.tkqlhce.com/click-1?PID=987654321")
        );
        assert_eq!(
            converter.convert("https://flexlnk.com/?foid=1").affiliate_url.as_deref(),
            Some("https://flexlnk.com/?foid=1&fobs=456789")
        );
    }

    #[test]
    fn test_update_settings_takes_effect_on_next_convert() {
        let registry = registry();
        let mut converter = LinkConverter::new(&registry, AffiliateSettings::new());
        assert!(!converter.convert("https://a.co/d/xyz").success);

        converter.update_settings(settings(&[("amazon", "shop-20")]));

        assert_eq!(
            converter.convert("https://a.co/d/xyz").affiliate_url.as_deref(),
            Some("https://a.co/d/xyz?tag=shop-20")
        );
        assert_eq!(converter.settings().affiliate_id("amazon"), Some("shop-20"));
    }

    #[test]
    fn test_is_affiliate_url() {
        let registry = registry();
        let converter = LinkConverter::new(&registry, AffiliateSettings::new());

        assert!(converter.is_affiliate_url("https://www.amazon.com/dp/B000?tag=anyone-20"));
        assert!(converter.is_affiliate_url("https://www.amazon.com/dp/B000?x=1&tag="));
        assert!(!converter.is_affiliate_url("https://www.amazon.com/dp/B000?campid=1"));
        assert!(!converter.is_affiliate_url("https://www.amazon.com/dp/B000"));
        assert!(!converter.is_affiliate_url("https://unknownshop.test/p?tag=x"));
        assert!(!converter.is_affiliate_url("not a url"));
    }

    #[test]
    fn test_conversion_result_wire_format() {
        let result = ConversionResult::converted("https://a.co/d/x", "https://a.co/d/x?tag=t-20".to_string(), "amazon");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], serde_json::Value::Bool(true));
        assert_eq!(json["affiliateUrl"], "https://a.co/d/x?tag=t-20");
        assert_eq!(json["originalUrl"], "https://a.co/d/x");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_set_query_param_on_empty_query() {
        assert_eq!(set_query_param(None, "tag", "x-20", ParamPlacement::Append), "tag=x-20");
        assert_eq!(set_query_param(Some(""), "aid", "1", ParamPlacement::Replace), "aid=1");
        assert_eq!(set_query_param(Some("a=1&&b=2"), "aid", "1", ParamPlacement::Replace), "a=1&b=2&aid=1");
    }
}
