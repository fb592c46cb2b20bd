/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    // Try to parse ISO format and convert to readable
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
        // Naive timestamps are common from Python backends
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 {
        date.chars().take(10).collect()
    } else {
        date.to_string()
    }
}

/// Replace every character with `*`, keeping the length visible
pub fn mask(s: &str) -> String {
    "*".repeat(s.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("😊😊😊😊", 4), "😊😊😊😊");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-10-03T08:15:00+00:00"), "Oct 03, 2024");
        assert_eq!(format_date("2024-10-03T08:15:00.123456"), "Oct 03, 2024");
        assert_eq!(format_date("2024-10-03 trailing"), "2024-10-03");
        assert_eq!(format_date("today"), "today");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("secret"), "******");
        assert_eq!(mask(""), "");
    }
}
