//! Scanning the inside of start and end tags.
//!
//! The lexer hands over whole tag slices such as `<a href="x" hidden>`. This
//! module splits them into a lowercased name and raw (still entity-encoded)
//! attribute pairs.

/// A scanned start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Written as `<name ... />`
    pub self_closing: bool,
}

/// Scan a `<name attr=value ...>` slice. Returns `None` if the slice is not a
/// start tag.
pub fn scan_start_tag(text: &str) -> Option<StartTag> {
    let inner = text.strip_prefix('<')?.strip_suffix('>')?;
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = &inner[..name_len];
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    Some(StartTag {
        name: name.to_ascii_lowercase(),
        attrs: scan_attributes(&inner[name_len..]),
        self_closing,
    })
}

/// Scan a `</name>` slice into its lowercased name.
pub fn scan_end_tag(text: &str) -> Option<String> {
    let inner = text.strip_prefix("</")?.strip_suffix('>')?;
    let name = inner.split(|c: char| c.is_whitespace()).next()?;
    if name.is_empty() {
        return None;
    }
    Some(name.to_ascii_lowercase())
}

fn scan_attributes(mut rest: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after_eq) => {
                let after_eq = after_eq.trim_start();
                let (value, remaining) = scan_value(after_eq);
                rest = remaining;
                value
            }
            None => String::new(),
        };

        if !name.is_empty() {
            attrs.push((name, value));
        }
    }

    attrs
}

fn scan_value(text: &str) -> (String, &str) {
    for quote in ['"', '\''] {
        if let Some(quoted) = text.strip_prefix(quote) {
            return match quoted.find(quote) {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            };
        }
    }

    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    (text[..end].to_string(), &text[end..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn attr(name: &str, value: &str) -> (String, String) {
        (name.to_string(), value.to_string())
    }

    #[test]
    fn bare_tag() {
        assert_eq!(
            scan_start_tag("<P>"),
            Some(StartTag {
                name: "p".to_string(),
                attrs: vec![],
                self_closing: false,
            })
        );
    }

    #[test]
    fn quoted_unquoted_and_boolean_attributes() {
        let tag = scan_start_tag(r#"<input type=checkbox checked data-x='a b' title="q">"#)
            .unwrap();
        assert_eq!(tag.name, "input");
        assert_eq!(
            tag.attrs,
            vec![
                attr("type", "checkbox"),
                attr("checked", ""),
                attr("data-x", "a b"),
                attr("title", "q"),
            ]
        );
    }

    #[rstest]
    #[case("<br/>", "br", true)]
    #[case("<br />", "br", true)]
    #[case("<img src=\"a.png\"/>", "img", true)]
    #[case("<span>", "span", false)]
    fn self_closing_detection(#[case] input: &str, #[case] name: &str, #[case] closing: bool) {
        let tag = scan_start_tag(input).unwrap();
        assert_eq!(tag.name, name);
        assert_eq!(tag.self_closing, closing);
    }

    #[test]
    fn attribute_with_spaces_around_equals() {
        let tag = scan_start_tag(r#"<a href = "x.html">"#).unwrap();
        assert_eq!(tag.attrs, vec![attr("href", "x.html")]);
    }

    #[rstest]
    #[case("</p>", Some("p"))]
    #[case("</DIV >", Some("div"))]
    #[case("</>", None)]
    fn end_tags(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(scan_end_tag(input).as_deref(), expected);
    }

    #[test]
    fn not_a_tag() {
        assert_eq!(scan_start_tag("<1>"), None);
        assert_eq!(scan_start_tag("p>"), None);
    }
}
