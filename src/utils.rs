// Utility functions
use chrono::{DateTime, Utc};

/// Parses an RFC 3339 string into a `DateTime<Utc>`, if possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts a string to kebab-case.
pub fn to_kebab_case(text: &str) -> String {
    text.to_lowercase().replace(" ", "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime() {
        let parsed = parse_datetime("2026-01-05T12:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-01-05T12:00:00+00:00");
        assert!(parse_datetime("not a date").is_none());
    }

    #[test]
    fn test_to_kebab_case() {
        assert_eq!(to_kebab_case("CRM Tools"), "crm-tools");
    }
}
