/// Which elements count as user-editable for input-triggered scans

/// The element attributes the decision depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableProbe {
    /// The `contentEditable` property: "true", "false" or "inherit"
    pub content_editable: String,
    pub tag_name: String,
    /// Google Docs marks its editing surface with this class
    pub has_notranslate_class: bool,
    pub role: Option<String>,
}

pub fn is_editable(probe: &EditableProbe) -> bool {
    probe.content_editable == "true"
        || probe.tag_name.eq_ignore_ascii_case("textarea")
        || probe.tag_name.eq_ignore_ascii_case("input")
        || probe.has_notranslate_class
        || probe.role.as_deref() == Some("textbox")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(tag_name: &str) -> EditableProbe {
        EditableProbe {
            content_editable: "inherit".to_string(),
            tag_name: tag_name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_form_controls() {
        assert!(is_editable(&probe("TEXTAREA")));
        assert!(is_editable(&probe("INPUT")));
        assert!(!is_editable(&probe("DIV")));
    }

    #[test]
    fn test_content_editable() {
        let div = EditableProbe {
            content_editable: "true".to_string(),
            ..probe("DIV")
        };
        assert!(is_editable(&div));

        let off = EditableProbe {
            content_editable: "false".to_string(),
            ..probe("DIV")
        };
        assert!(!is_editable(&off));
    }

    #[test]
    fn test_markers() {
        let docs = EditableProbe {
            has_notranslate_class: true,
            ..probe("DIV")
        };
        assert!(is_editable(&docs));

        let textbox = EditableProbe {
            role: Some("textbox".to_string()),
            ..probe("SPAN")
        };
        assert!(is_editable(&textbox));

        let button = EditableProbe {
            role: Some("button".to_string()),
            ..probe("SPAN")
        };
        assert!(!is_editable(&button));
    }
}
