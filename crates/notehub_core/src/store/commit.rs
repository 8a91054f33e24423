//! Commit messages attached to every mutation.

use chrono::NaiveDate;

pub fn create(path: &str) -> String {
    format!("Create {}", path)
}

pub fn update(path: &str) -> String {
    format!("Update {}", path)
}

pub fn delete(path: &str) -> String {
    format!("Delete {}", path)
}

pub fn create_directory(path: &str) -> String {
    format!("Create directory {}", path)
}

pub fn update_daily_note(date: NaiveDate) -> String {
    format!("Update daily note {}", date.format("%Y-%m-%d"))
}

pub fn append_daily_note(date: NaiveDate) -> String {
    format!("Append to daily note {}", date.format("%Y-%m-%d"))
}

/// `Create` or `Update` depending on whether a token is held.
pub fn for_write(path: &str, has_token: bool) -> String {
    if has_token { update(path) } else { create(path) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(update_daily_note(date), "Update daily note 2024-03-01");
        assert_eq!(append_daily_note(date), "Append to daily note 2024-03-01");
        assert_eq!(for_write("Notes/a.md", false), "Create Notes/a.md");
        assert_eq!(for_write("Notes/a.md", true), "Update Notes/a.md");
        assert_eq!(create_directory("Projects"), "Create directory Projects");
    }
}
