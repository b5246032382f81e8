use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A line break, any whitespace (including further line breaks), then at least one more
/// line break. Collapses any run of blank or whitespace-only lines into one blank line.
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n+").unwrap());

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

/// Canonicalize extracted text.
///
/// - NFKC normalization, so compatibility glyphs (ligatures, full-width forms,
///   non-breaking spaces) compare equal to their plain forms downstream
/// - runs of blank lines collapse to exactly one blank line
/// - runs of spaces/tabs collapse to a single space
/// - leading and trailing whitespace is trimmed
///
/// Empty input yields an empty string. The function is idempotent.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let composed: String = raw.nfkc().collect();
    let text = BLANK_LINES.replace_all(&composed, "\n\n");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    text.trim().to_string()
}

/// True when the text has no content once normalized.
pub fn is_blank(text: &str) -> bool {
    normalize(text).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn collapses_blank_line_runs() {
        assert_eq!(normalize("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n   \n\t\n b"), "a\n\n b");
        // A single line break is kept as is.
        assert_eq!(normalize("a\nb"), "a\nb");
    }

    #[test]
    fn collapses_horizontal_whitespace() {
        assert_eq!(normalize("Name  \t Amount"), "Name Amount");
        assert_eq!(normalize("   padded   "), "padded");
    }

    #[test]
    fn applies_nfkc() {
        // ﬁ ligature, full-width digits, non-breaking space
        assert_eq!(normalize("ﬁnance"), "finance");
        assert_eq!(normalize("１２３"), "123");
        assert_eq!(normalize("a\u{00A0}\u{00A0}b"), "a b");
    }

    #[test]
    fn keeps_arabic_and_french_text() {
        assert_eq!(normalize("  appel d'offres  "), "appel d'offres");
        assert_eq!(normalize("طلب   عروض"), "طلب عروض");
        assert_eq!(normalize("Réf. N°  12"), "Réf. N° 12");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "",
            "plain",
            "a\n \n\n\tb  c",
            "\r\n\r\n x \r\n",
            "ﬁ  ﬂ\u{3000}end\n\n\n",
            "[PDF PAGE 1/2]\nfoo\n\n\n[PDF PAGE 2/2]\n  bar ",
            "  \n\t\n  ",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(" \n\t\n "));
        assert!(!is_blank(" x "));
    }
}
