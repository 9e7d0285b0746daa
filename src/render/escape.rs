//! HTML escaping for user-authored text

/// Escape `& < > " '` so the text can sit in element content or a quoted attribute
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Absent text escapes to the empty string
pub fn escape_opt(text: Option<&str>) -> String {
    text.map(escape).unwrap_or_default()
}

/// Reverse of [`escape`]; what a browser reads back as the element's text
pub fn unescape(html: &str) -> String {
    html.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_empty_and_absent() {
        assert_eq!(escape(""), "");
        assert_eq!(escape_opt(None), "");
        assert_eq!(escape_opt(Some("a<b")), "a&lt;b");
    }

    #[test]
    fn test_escape_is_not_idempotent_on_entities() {
        assert_eq!(escape("&amp;"), "&amp;amp;");
        assert_eq!(unescape(&escape("&amp;")), "&amp;");
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn escaped_text_has_no_raw_specials(ref input in ".{0,200}") {
            let out = escape(input);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains('>'));
            prop_assert!(!out.contains('"'));
            prop_assert!(!out.contains('\''));
            // every remaining '&' opens one of the five entities
            for (i, _) in out.match_indices('&') {
                let rest = &out[i..];
                prop_assert!(
                    ["&amp;", "&lt;", "&gt;", "&quot;", "&#39;"].iter().any(|e| rest.starts_with(e))
                );
            }
        }

        #[test]
        fn escape_round_trips_through_text_content(ref input in ".{0,200}") {
            prop_assert_eq!(unescape(&escape(input)), input.clone());
        }
    }
}
