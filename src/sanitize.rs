//! Cleaning of user-supplied text before it reaches the comment table.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{ParseError, Url};

static SCRIPT_STYLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script[^>]*?>.*?</script\s*>|<style[^>]*?>.*?</style\s*>").unwrap()
});
// A `<` only opens a tag when a name, `/`, `!` or `?` follows; "I <3 it" is text.
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[A-Za-z/!?][^>]*>").unwrap());
static OCTET_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[a-fA-F0-9]{2}").unwrap());
static WHITESPACE_RUN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n\t ]+").unwrap());
static HORIZONTAL_RUN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\t ]+").unwrap());
static URL_DISALLOWED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9\-~+_.?#=!&;,/:%@$|*'()\[\]\x{80}-\x{10FFFF}]").unwrap());
static EMAIL_LOCAL_DISALLOWED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9!#$%&'*+/=?^_`{|}~.\-]").unwrap());
static DOMAIN_LABEL_DISALLOWED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\-]+").unwrap());

const ALLOWED_URL_SCHEMES: [&str; 11] = [
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "gopher", "nntp", "feed", "telnet",
];

/// Cleans the free-form columns of a review row.
///
/// Passed into the mapper so hosts with their own escaping rules can swap it.
pub trait Sanitizer {
    /// Single-line plain text: names, IPs, SKUs, titles.
    fn text_field(&self, raw: &str) -> String;
    /// Multi-line plain text; line breaks survive.
    fn textarea_field(&self, raw: &str) -> String;
    /// Returns an empty string when no usable address remains.
    fn email(&self, raw: &str) -> String;
    /// Returns an empty string for unusable or unsafe URLs.
    fn url(&self, raw: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardSanitizer;

impl StandardSanitizer {
    fn strip_markup(raw: &str) -> String {
        if !raw.contains('<') {
            return raw.to_string();
        }
        let without_blocks = SCRIPT_STYLE_PATTERN.replace_all(raw, "");
        TAG_PATTERN.replace_all(&without_blocks, "").into_owned()
    }

    fn strip_octets(mut s: String) -> String {
        // Removing one octet can splice two halves into a new one.
        while OCTET_PATTERN.is_match(&s) {
            s = OCTET_PATTERN.replace_all(&s, "").into_owned();
        }
        s
    }

    fn clean(&self, raw: &str, keep_newlines: bool) -> String {
        let normalized = raw.replace("\r\n", "\n");
        let stripped = Self::strip_markup(&normalized);
        let no_controls: String = stripped
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
            .collect();

        let collapsed = if keep_newlines {
            HORIZONTAL_RUN_PATTERN.replace_all(&no_controls, " ")
        } else {
            WHITESPACE_RUN_PATTERN.replace_all(&no_controls, " ")
        };

        Self::strip_octets(collapsed.trim().to_string())
            .trim()
            .to_string()
    }
}

impl Sanitizer for StandardSanitizer {
    fn text_field(&self, raw: &str) -> String {
        self.clean(raw, false)
    }

    fn textarea_field(&self, raw: &str) -> String {
        let cleaned = self.clean(raw, true);
        cleaned
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn email(&self, raw: &str) -> String {
        let email = raw.trim();
        if email.len() < 6 {
            return String::new();
        }
        let Some(at) = email
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .map(|(i, _)| i)
        else {
            return String::new();
        };
        let (local, domain) = (&email[..at], &email[at + 1..]);

        let local = EMAIL_LOCAL_DISALLOWED_PATTERN.replace_all(local, "");
        if local.is_empty() {
            return String::new();
        }

        let domain = domain.to_ascii_lowercase();
        let labels: Vec<String> = domain
            .split('.')
            .map(|label| {
                let trimmed = label.trim_matches(|c: char| c.is_whitespace() || c == '-');
                DOMAIN_LABEL_DISALLOWED_PATTERN
                    .replace_all(trimmed, "")
                    .trim_matches('-')
                    .to_string()
            })
            .filter(|label| !label.is_empty())
            .collect();
        if labels.len() < 2 {
            return String::new();
        }

        format!("{local}@{}", labels.join("."))
    }

    fn url(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }
        let spaced = trimmed.replace(' ', "%20");
        let filtered = URL_DISALLOWED_PATTERN.replace_all(&spaced, "").into_owned();
        if filtered.is_empty() {
            return String::new();
        }

        match Url::parse(&filtered) {
            Ok(parsed) if ALLOWED_URL_SCHEMES.contains(&parsed.scheme()) => filtered,
            Ok(_) => String::new(),
            Err(ParseError::RelativeUrlWithoutBase) => {
                if filtered.starts_with(['/', '#', '?']) {
                    return filtered;
                }
                let prefixed = format!("http://{filtered}");
                match Url::parse(&prefixed) {
                    Ok(_) => prefixed,
                    Err(_) => String::new(),
                }
            }
            Err(_) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: StandardSanitizer = StandardSanitizer;

    #[test]
    fn text_field_strips_markup_and_whitespace() {
        assert_eq!(S.text_field("  Jane <b>Doe</b>\n\t "), "Jane Doe");
        assert_eq!(S.text_field("<script>alert(1)</script>Bob"), "Bob");
        assert_eq!(S.text_field("a\u{0007}b"), "ab");
        assert_eq!(S.text_field("100%41off"), "100off");
        assert_eq!(S.text_field("5 < 6"), "5 < 6");
        assert_eq!(S.text_field("4 < 5 but > 3"), "4 < 5 but > 3");
        assert_eq!(
            S.text_field("Rating 4 < 5 but price > 20"),
            "Rating 4 < 5 but price > 20"
        );
        assert_eq!(S.text_field("<!-- note -->Bob</p>"), "Bob");
    }

    #[test]
    fn textarea_keeps_bare_angle_brackets() {
        assert_eq!(S.textarea_field("I <3 it > 300ml"), "I <3 it > 300ml");
        assert_eq!(
            S.textarea_field("I <3 this mug, and it holds > 300ml. Great!"),
            "I <3 this mug, and it holds > 300ml. Great!"
        );
    }

    #[test]
    fn textarea_keeps_line_breaks() {
        assert_eq!(
            S.textarea_field("Great  product.\r\n<i>Would</i> buy again. \n"),
            "Great product.\nWould buy again."
        );
    }

    #[test]
    fn emails() {
        assert_eq!(S.email(" jane@example.com "), "jane@example.com");
        assert_eq!(S.email("Jane(x)@Example.COM"), "Janex@example.com");
        assert_eq!(S.email("a@b.c"), "");
        assert_eq!(S.email("no-at-sign.example.com"), "");
        assert_eq!(S.email("@example.com"), "");
        assert_eq!(S.email("jane@localhost"), "");
        assert_eq!(S.email("jane@-ex_ample-.com"), "jane@example.com");
    }

    #[test]
    fn urls() {
        assert_eq!(S.url("https://example.com/a b"), "https://example.com/a%20b");
        assert_eq!(S.url("example.com/shop"), "http://example.com/shop");
        assert_eq!(S.url("/relative/path"), "/relative/path");
        assert_eq!(S.url("javascript:alert(1)"), "");
        assert_eq!(S.url("https://exa<mple>.com"), "https://example.com");
        assert_eq!(S.url(""), "");
    }
}
