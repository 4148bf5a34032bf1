/// Affiliate program table and hostname matching for Link Monetizer
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("Invalid hostname pattern for {program}: {source}")]
    InvalidPattern {
        program: String,
        #[source]
        source: regex::Error,
    },

    #[error("Duplicate program id: {0}")]
    DuplicateId(String),
}

/// How the affiliate parameter is written into an existing query string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPlacement {
    /// Drop every existing occurrence, then append at the end
    Append,
    /// Overwrite the first occurrence in place, drop the rest, append if absent
    Replace,
}

/// Expected shape of a user's affiliate id for a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFormat {
    /// Associate tag ending in a two-digit locale suffix, e.g. `shop-20`
    AssociateTag,
    Numeric,
    Slug,
}

/// Static description of a program, compiled into an `AffiliateProgram`
#[derive(Debug, Clone, Copy)]
pub struct ProgramDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub domain: &'static str,
    pub param_name: &'static str,
    pub icon: &'static str,
    pub patterns: &'static [&'static str],
    pub placement: ParamPlacement,
    pub id_format: IdFormat,
}

/// Programs known to the extension, in match priority order.
pub const BUILTIN_PROGRAMS: &[ProgramDefinition] = &[
    ProgramDefinition {
        id: "amazon",
        name: "Amazon Associates",
        domain: "amazon",
        param_name: "tag",
        icon: "🛒",
        patterns: &[
            r"amazon\.(com|co\.uk|de|fr|it|es|ca|com\.au|co\.jp|in|com\.br)",
            r"amzn\.(to|com)",
            r"a\.co",
        ],
        placement: ParamPlacement::Append,
        id_format: IdFormat::AssociateTag,
    },
    ProgramDefinition {
        id: "ebay",
        name: "eBay Partner Network",
        domain: "ebay",
        param_name: "campid",
        icon: "🏪",
        patterns: &[r"ebay\.(com|co\.uk|de|fr|it|es|ca|com\.au)", r"rover\.ebay\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Numeric,
    },
    ProgramDefinition {
        id: "booking",
        name: "Booking.com Affiliate",
        domain: "booking.com",
        param_name: "aid",
        icon: "🏨",
        patterns: &[r"booking\.com", r"bstatic\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Numeric,
    },
    ProgramDefinition {
        id: "aliexpress",
        name: "AliExpress Affiliate",
        domain: "aliexpress",
        param_name: "aff_trace_key",
        icon: "🛍️",
        patterns: &[r"aliexpress\.(com|us)", r"s\.click\.aliexpress\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Slug,
    },
    ProgramDefinition {
        id: "walmart",
        name: "Walmart Affiliate",
        domain: "walmart.com",
        param_name: "wmlspartner",
        icon: "🏬",
        patterns: &[r"walmart\.com", r"walmart\.ca"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Slug,
    },
    ProgramDefinition {
        id: "target",
        name: "Target Affiliate",
        domain: "target.com",
        param_name: "afid",
        icon: "🎯",
        patterns: &[r"target\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Slug,
    },
    ProgramDefinition {
        id: "shareasale",
        name: "ShareASale",
        domain: "shareasale.com",
        param_name: "afftrack",
        icon: "🤝",
        patterns: &[r"shareasale\.com", r"sas7\.net"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Numeric,
    },
    ProgramDefinition {
        id: "cj",
        name: "CJ Affiliate",
        domain: "commission-junction.com",
        param_name: "PID",
        icon: "🔗",
        patterns: &[
            r"commission-junction\.com",
            r"cj\.com",
            r"tkqlhce\.com",
            r"dpbolvw\.net",
        ],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Numeric,
    },
    ProgramDefinition {
        id: "impact",
        name: "Impact",
        domain: "impact.com",
        param_name: "irclickid",
        icon: "📈",
        patterns: &[r"impact\.com", r"impact-affiliate\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Slug,
    },
    ProgramDefinition {
        id: "flexoffers",
        name: "FlexOffers",
        domain: "flexoffers.com",
        param_name: "fobs",
        icon: "💼",
        patterns: &[r"flexoffers\.com", r"flexlnk\.com"],
        placement: ParamPlacement::Replace,
        id_format: IdFormat::Numeric,
    },
];

/// A commerce partner whose links accept a tracking parameter
#[derive(Debug, Clone)]
pub struct AffiliateProgram {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub param_name: String,
    pub icon: String,
    pub patterns: Vec<Regex>,
    pub placement: ParamPlacement,
    pub id_format: IdFormat,
}

impl AffiliateProgram {
    pub fn from_definition(def: &ProgramDefinition) -> Result<Self, ProgramError> {
        let patterns = def
            .patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ProgramError::InvalidPattern {
                    program: def.id.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AffiliateProgram {
            id: def.id.to_string(),
            name: def.name.to_string(),
            domain: def.domain.to_string(),
            param_name: def.param_name.to_string(),
            icon: def.icon.to_string(),
            patterns,
            placement: def.placement,
            id_format: def.id_format,
        })
    }

    /// Loose match: substring containment of the primary domain, or any pattern.
    ///
    /// Containment is unanchored, so `notamazon.example` matches "amazon".
    pub fn matches_host(&self, hostname: &str) -> bool {
        hostname.contains(&self.domain) || self.patterns.iter().any(|p| p.is_match(hostname))
    }
}

/// Ordered, immutable set of affiliate programs
#[derive(Debug, Clone)]
pub struct ProgramRegistry {
    programs: Vec<AffiliateProgram>,
}

impl ProgramRegistry {
    pub fn new(programs: Vec<AffiliateProgram>) -> Result<Self, ProgramError> {
        let mut seen = HashSet::new();
        for program in &programs {
            if !seen.insert(program.id.as_str()) {
                return Err(ProgramError::DuplicateId(program.id.clone()));
            }
        }
        Ok(ProgramRegistry { programs })
    }

    pub fn from_definitions(defs: &[ProgramDefinition]) -> Result<Self, ProgramError> {
        let programs = defs
            .iter()
            .map(AffiliateProgram::from_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(programs)
    }

    pub fn builtin() -> Result<Self, ProgramError> {
        Self::from_definitions(BUILTIN_PROGRAMS)
    }

    pub fn programs(&self) -> &[AffiliateProgram] {
        &self.programs
    }

    pub fn find_by_id(&self, id: &str) -> Option<&AffiliateProgram> {
        self.programs.iter().find(|p| p.id == id)
    }

    /// First program in declaration order that matches the hostname
    pub fn find_by_domain(&self, hostname: &str) -> Option<&AffiliateProgram> {
        self.programs.iter().find(|p| p.matches_host(hostname))
    }

    pub fn find_by_url(&self, url: &str) -> Option<&AffiliateProgram> {
        let parsed = Url::parse(url).ok()?;
        let hostname = parsed.host_str()?.to_lowercase();
        self.find_by_domain(&hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProgramRegistry {
        ProgramRegistry::builtin().unwrap()
    }

    #[test]
    fn test_builtin_registry_compiles() {
        let registry = registry();
        assert_eq!(registry.programs().len(), 10);
        assert_eq!(registry.programs()[0].id, "amazon");
        assert_eq!(registry.programs()[9].id, "flexoffers");
    }

    #[test]
    fn test_find_by_id() {
        let registry = registry();
        assert_eq!(registry.find_by_id("ebay").map(|p| p.param_name.as_str()), Some("campid"));
        assert_eq!(registry.find_by_id("cj").map(|p| p.param_name.as_str()), Some("PID"));
        assert!(registry.find_by_id("Amazon").is_none());
        assert!(registry.find_by_id("unknown").is_none());
    }

    #[test]
    fn test_find_by_domain_substring() {
        let registry = registry();
        assert_eq!(registry.find_by_domain("www.amazon.com").map(|p| p.id.as_str()), Some("amazon"));
        assert_eq!(registry.find_by_domain("smile.amazon.co.uk").map(|p| p.id.as_str()), Some("amazon"));
        assert_eq!(registry.find_by_domain("ebay.com").map(|p| p.id.as_str()), Some("ebay"));
        assert_eq!(registry.find_by_domain("www.booking.com").map(|p| p.id.as_str()), Some("booking"));
    }

    #[test]
    fn test_find_by_domain_patterns() {
        let registry = registry();
        assert_eq!(registry.find_by_domain("a.co").map(|p| p.id.as_str()), Some("amazon"));
        assert_eq!(registry.find_by_domain("amzn.to").map(|p| p.id.as_str()), Some("amazon"));
        assert_eq!(registry.find_by_domain("cf.bstatic.com").map(|p| p.id.as_str()), Some("booking"));
        assert_eq!(registry.find_by_domain("www.walmart.ca").map(|p| p.id.as_str()), Some("walmart"));
        assert_eq!(registry.find_by_domain("www.tkqlhce.com").map(|p| p.id.as_str()), Some("cj"));
        assert_eq!(registry.find_by_domain("flexlnk.com").map(|p| p.id.as_str()), Some("flexoffers"));
    }

    #[test]
    fn test_find_by_domain_is_loose() {
        let registry = registry();
        // Unanchored containment: lookalike hosts still match
        assert_eq!(registry.find_by_domain("notamazon.example").map(|p| p.id.as_str()), Some("amazon"));
        assert_eq!(registry.find_by_domain("mytarget.com").map(|p| p.id.as_str()), Some("target"));
    }

    #[test]
    fn test_declaration_order_wins() {
        let registry = registry();
        // Contains both "amazon" and "ebay"; amazon is declared first
        assert_eq!(registry.find_by_domain("amazon-ebay.test").map(|p| p.id.as_str()), Some("amazon"));
    }

    #[test]
    fn test_find_by_domain_no_match() {
        let registry = registry();
        assert!(registry.find_by_domain("unknownshop.test").is_none());
        assert!(registry.find_by_domain("github.com").is_none());
        assert!(registry.find_by_domain("").is_none());
    }

    #[test]
    fn test_find_by_url() {
        let registry = registry();
        assert_eq!(
            registry.find_by_url("https://WWW.AMAZON.COM/dp/B000").map(|p| p.id.as_str()),
            Some("amazon")
        );
        assert_eq!(
            registry.find_by_url("https://s.click.aliexpress.com/e/abc").map(|p| p.id.as_str()),
            Some("aliexpress")
        );
        assert!(registry.find_by_url("not a url").is_none());
        assert!(registry.find_by_url("https://example.org/amazon").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let defs = [BUILTIN_PROGRAMS[0], BUILTIN_PROGRAMS[0]];
        let err = ProgramRegistry::from_definitions(&defs).unwrap_err();
        assert!(matches!(err, ProgramError::DuplicateId(id) if id == "amazon"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let def = ProgramDefinition {
            patterns: &["shop\\.(com"],
            ..BUILTIN_PROGRAMS[1]
        };
        let err = AffiliateProgram::from_definition(&def).unwrap_err();
        assert!(matches!(err, ProgramError::InvalidPattern { ref program, .. } if program == "ebay"));
    }

    #[test]
    fn test_custom_program_needs_no_converter_change() {
        let defs = [ProgramDefinition {
            id: "etsy",
            name: "Etsy Affiliate",
            domain: "etsy.com",
            param_name: "utm_source",
            icon: "🧶",
            patterns: &[],
            placement: ParamPlacement::Replace,
            id_format: IdFormat::Slug,
        }];
        let registry = ProgramRegistry::from_definitions(&defs).unwrap();
        assert_eq!(registry.find_by_url("https://www.etsy.com/listing/1").map(|p| p.id.as_str()), Some("etsy"));
    }
}
