//! Cleanup of daily note content.
//!
//! Notes written by other tools often carry front-matter, a `date:` line or
//! a dated heading. Those are stripped so the body can be edited and
//! appended to without duplicating headers.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^---\n[\s\S]*?\n---(?:\n+|$)").expect("valid front-matter regex")
});
static DATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^date:\s*(\d{4}-\d{2}-\d{2}).*(?:\n|$)").expect("valid date line regex")
});
static DIARY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#\s*\d{4}-\d{2}-\d{2}.*日记.*(?:\n|$)").expect("valid diary heading regex")
});
static DATED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#\s*(\d{4}-\d{2}-\d{2}).*(?:\n|$)").expect("valid dated heading regex")
});

/// Strip front-matter, `date:` lines and dated headings, then trim.
///
/// Each rule removes at most one occurrence, applied in order: the
/// front-matter block at the very start, a `date:` line for `date`, any
/// other `date: YYYY-MM-DD` line, a `# YYYY-MM-DD … 日记` heading and a
/// `# <date>` heading. A rule matches whether or not its line ends with a
/// newline.
pub fn sanitize_daily_content(raw: &str, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d").to_string();

    let text = remove_first(raw, &FRONT_MATTER, None);
    let text = remove_first(&text, &DATE_LINE, Some(&date));
    let text = remove_first(&text, &DATE_LINE, None);
    let text = remove_first(&text, &DIARY_HEADING, None);
    let text = remove_first(&text, &DATED_HEADING, Some(&date));
    text.trim().to_string()
}

/// Remove the first match of `re`; with `date`, only a match whose first
/// group is that date.
fn remove_first(text: &str, re: &Regex, date: Option<&str>) -> String {
    let found = re
        .captures_iter(text)
        .find(|caps| date.is_none_or(|d| caps.get(1).is_some_and(|m| m.as_str() == d)))
        .and_then(|caps| caps.get(0));

    match found {
        Some(m) => format!("{}{}", &text[..m.start()], &text[m.end()..]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_strips_front_matter_and_heading() {
        let raw = "---\ntitle: x\ndate: 2024-03-01\n---\n\n# 2024-03-01 日记\n\nWent running.\n";
        assert_eq!(sanitize_daily_content(raw, date()), "Went running.");
    }

    #[test]
    fn test_strips_date_line() {
        let raw = "date: 2024-03-01 (Fri)\n# 2024-03-01\nbody\n";
        assert_eq!(sanitize_daily_content(raw, date()), "body");
    }

    #[test]
    fn test_other_date_line_is_stripped() {
        let raw = "date: 2023-12-31\nbody\n";
        assert_eq!(sanitize_daily_content(raw, date()), "body");
    }

    #[test]
    fn test_plain_content_is_only_trimmed() {
        let raw = "\n\n**09:00** coffee\n\n**10:30** standup\n\n";
        assert_eq!(
            sanitize_daily_content(raw, date()),
            "**09:00** coffee\n\n**10:30** standup"
        );
    }

    #[test]
    fn test_last_line_without_newline() {
        assert_eq!(sanitize_daily_content("# 2024-03-01", date()), "");
        assert_eq!(sanitize_daily_content("---\nmood: ok\n---", date()), "");
        assert_eq!(sanitize_daily_content("body\n# 2024-03-01", date()), "body");
        assert_eq!(sanitize_daily_content("body\ndate: 2024-03-01", date()), "body");
    }

    #[test]
    fn test_heading_for_another_day_is_kept() {
        let raw = "# 2024-02-29 notes\n# 2024-03-01\nbody";
        assert_eq!(
            sanitize_daily_content(raw, date()),
            "# 2024-02-29 notes\nbody"
        );
    }

    #[test]
    fn test_idempotent() {
        let raw = "---\na: b\n---\n# 2024-03-01\nline one\n\nline two";
        let once = sanitize_daily_content(raw, date());
        assert_eq!(sanitize_daily_content(&once, date()), once);
    }

    #[test]
    fn test_headings_for_other_days_survive() {
        let raw = "# 2024-02-29 notes\nbody";
        assert_eq!(sanitize_daily_content(raw, date()), raw);
    }
}
