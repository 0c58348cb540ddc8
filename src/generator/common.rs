//! Common utilities for document generation.
//!
//! Shared helpers for filename slugs, date and currency display, and the
//! fixed-width word wrapping used by the terms block.

use chrono::NaiveDate;

/// Format a date for display on the document (e.g. "August 06, 2026").
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Format an amount as US currency with thousands separators, e.g.
/// `$5,000.00`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let whole = (cents / 100).abs();
    let fraction = (cents % 100).abs();

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}${grouped}.{fraction:02}")
}

/// Slugify a string for use in filenames.
pub fn filename_slug(name: &str, fallback: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Greedy word wrap at a fixed column width.
///
/// Whitespace (including newlines) is collapsed, matching how the terms
/// field is rendered as a single flowed paragraph. Words longer than the
/// width are hard-split.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let head: String = word.chars().take(max_chars).collect();
            word = &word[head.len()..];
            lines.push(head);
        }
        if word.is_empty() {
            continue;
        }
        if line.is_empty() {
            line.push_str(word);
        } else if line.chars().count() + 1 + word.chars().count() <= max_chars {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

/// Truncate a single display line, appending "..." when it was cut.
pub fn truncate_line(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(5000.0), "$5,000.00");
        assert_eq!(format_currency(1234567.89), "$1,234,567.89");
        assert_eq!(format_currency(0.5), "$0.50");
        assert_eq!(format_currency(999.999), "$1,000.00");
    }

    #[test]
    fn test_filename_slug() {
        assert_eq!(filename_slug("John Smith", "fallback"), "john-smith");
        assert_eq!(filename_slug("  Spaces  ", "fallback"), "spaces");
        assert_eq!(filename_slug("", "fallback"), "fallback");
        assert_eq!(filename_slug("Test--Name", "fb"), "test-name");
        assert_eq!(filename_slug("@#$%", "doc"), "doc");
    }

    #[test]
    fn test_wrap_text_reflows_paragraph() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
    }

    #[test]
    fn test_wrap_text_collapses_newlines() {
        let lines = wrap_text("first\nsecond\n\nthird", 40);
        assert_eq!(lines, vec!["first second third"]);
    }

    #[test]
    fn test_wrap_text_hard_splits_long_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_truncate_line() {
        assert_eq!(truncate_line("short", 10), "short");
        assert_eq!(truncate_line("a rather long value", 10), "a rathe...");
    }

    #[test]
    fn test_format_display_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 6).unwrap();
        assert_eq!(format_display_date(date), "August 06, 2026");
    }
}
