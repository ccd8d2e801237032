//! Identifier conventions: split camelCase / snake_case identifiers into
//! token lists and render them back out. Well-known acronyms tokenize as one
//! unit so `XMLHTTPRequest` and `XmlHttpRequest` produce the same tokens.
use once_cell::sync::Lazy;
use regex::Regex;

/// Tokenized identifier. `parts` are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub starts_with_capital: bool,
    pub parts: Vec<String>,
}

impl Tokens {
    pub fn new(starts_with_capital: bool, parts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Tokens {
            starts_with_capital,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }
}

// Alternation order matters: acronyms before the single-capital fallback.
static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new("JSON|HTTPS|HTTP|XML|ID|[A-Z]").unwrap());

pub fn tokenize_camel_case(ident: &str) -> Tokens {
    let mut s = 0usize;
    let mut starts_with_capital = false;
    let mut parts: Vec<String> = Vec::new();
    let mut keep = String::new();

    for m in CAMEL_BOUNDARY.find_iter(ident) {
        if m.start() > s {
            parts.push(format!("{keep}{}", &ident[s..m.start()]).to_lowercase());
            keep.clear();
            if s == 0 {
                starts_with_capital = true;
            }
        }
        if m.end() - m.start() == 1 {
            // single capital: hold it until the following run completes
            if !keep.is_empty() {
                parts.push(keep.to_lowercase());
            }
            keep = ident[m.start()..m.end()].to_string();
        } else {
            parts.push(ident[m.start()..m.end()].to_lowercase());
        }
        s = m.end();
    }
    if s < ident.len() || !keep.is_empty() {
        parts.push(format!("{keep}{}", &ident[s..]).to_lowercase());
    }

    Tokens { starts_with_capital, parts }
}

pub fn tokenize_snake_case(ident: &str, starts_with_capital: bool) -> Tokens {
    Tokens {
        starts_with_capital,
        parts: ident.split('_').map(str::to_string).collect(),
    }
}

pub fn render_as_snake_case(tokens: &Tokens) -> String {
    tokens.parts.join("_")
}

pub fn render_as_camel_case(tokens: &Tokens) -> String {
    tokens
        .parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == 0 && !tokens.starts_with_capital {
                part.clone()
            } else {
                capitalize(part)
            }
        })
        .collect()
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_camel_case_splits_acronyms() {
        assert_eq!(
            tokenize_camel_case("ABC"),
            Tokens::new(false, ["a", "b", "c"]),
        );
        assert_eq!(
            tokenize_camel_case("XMLHTTPRequest"),
            Tokens::new(false, ["xml", "http", "request"]),
        );
        assert_eq!(
            tokenize_camel_case("XmlHttpRequest"),
            Tokens::new(false, ["xml", "http", "request"]),
        );
    }

    #[test]
    fn tokenize_camel_case_plain_identifiers() {
        assert_eq!(
            tokenize_camel_case("getWidget").parts,
            vec!["get".to_string(), "widget".to_string()],
        );
        assert_eq!(tokenize_camel_case("widget").parts, vec!["widget".to_string()]);
    }

    #[test]
    fn render_camel_case_respects_capital_flag() {
        assert_eq!(render_as_camel_case(&Tokens::new(false, ["a", "b", "c"])), "aBC");
        assert_eq!(
            render_as_camel_case(&Tokens::new(false, ["xml", "http", "request"])),
            "xmlHttpRequest",
        );
        assert_eq!(
            render_as_camel_case(&Tokens::new(true, ["xml", "http", "request"])),
            "XmlHttpRequest",
        );
    }

    #[test]
    fn snake_case_round_trip() {
        let t = tokenize_snake_case("list_widget", true);
        assert_eq!(render_as_snake_case(&t), "list_widget");
        assert_eq!(render_as_camel_case(&t), "ListWidget");
    }
}
