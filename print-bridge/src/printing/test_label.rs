//! Synthesized test label

use chrono::{DateTime, Local};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Test label stamped with the current local time
pub fn test_label() -> String {
    test_label_at(Local::now())
}

/// Test label stamped with `at`
pub fn test_label_at(at: DateTime<Local>) -> String {
    format!(
        "^XA^CF0,30^FO30,30^FDPrint Bridge Test^FS^FO30,80^FD{}^FS^XZ",
        at.format(TIMESTAMP_FORMAT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kiosk_printer::zpl;

    #[test]
    fn test_label_embeds_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 10, 11, 9, 30, 5).unwrap();
        let label = test_label_at(at);
        assert!(label.contains("^FD2026-10-11 09:30:05^FS"));
    }

    #[test]
    fn test_label_passes_validation() {
        assert!(zpl::syntax_valid(&test_label()));
        assert!(zpl::security_valid(&test_label()).is_ok());
    }
}
