use crate::error::TimerError;

/// Split milliseconds into whole hours, minutes and seconds (floored).
pub fn hms_parts(ms: u64) -> (u64, u64, u64) {
    let total_secs = ms / 1000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    (h, m, s)
}

/// Format milliseconds as "MM:SS", or "HH:MM:SS" from one hour up
pub fn format_time(ms: u64) -> String {
    let (h, m, s) = hms_parts(ms);
    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

/// Parse "SS", "MM:SS" or "HH:MM:SS" into milliseconds.
///
/// Fields are not range checked beyond being non-negative integers, so
/// "90" and "1:30" are the same duration.
pub fn parse_duration(text: &str) -> Result<u64, TimerError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TimerError::InvalidDuration("empty duration".into()));
    }

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return Err(TimerError::InvalidDuration(format!("too many fields in '{}'", text)));
    }

    let mut secs: u64 = 0;
    for part in &parts {
        let part = part.trim();
        let value: u64 = part
            .parse()
            .map_err(|_| TimerError::InvalidDuration(format!("'{}' is not a whole number", part)))?;
        secs = secs
            .checked_mul(60)
            .and_then(|s| s.checked_add(value))
            .ok_or_else(|| TimerError::InvalidDuration(format!("'{}' is too long", text)))?;
    }
    secs.checked_mul(1000)
        .ok_or_else(|| TimerError::InvalidDuration(format!("'{}' is too long", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(999), "00:00");
        assert_eq!(format_time(61_000), "01:01");
        assert_eq!(format_time(1_500_000), "25:00");
        assert_eq!(format_time(3_599_999), "59:59");
        assert_eq!(format_time(3_661_000), "01:01:01");
        assert_eq!(format_time(99 * 3_600_000), "99:00:00");
    }

    #[test]
    fn test_hms_parts() {
        assert_eq!(hms_parts(0), (0, 0, 0));
        assert_eq!(hms_parts(300_000), (0, 5, 0));
        assert_eq!(hms_parts(3_725_400), (1, 2, 5));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45"), Ok(45_000));
        assert_eq!(parse_duration("05:00"), Ok(300_000));
        assert_eq!(parse_duration(" 1:30 "), Ok(90_000));
        assert_eq!(parse_duration("90"), Ok(90_000));
        assert_eq!(parse_duration("01:02:03"), Ok(3_723_000));
        assert_eq!(parse_duration("0"), Ok(0));
    }

    #[test]
    fn test_parse_duration_rejects() {
        for bad in ["", "-5", "1:-2", "abc", "1:2:3:4", "1.5", "::"] {
            assert!(
                matches!(parse_duration(bad), Err(TimerError::InvalidDuration(_))),
                "accepted {:?}",
                bad
            );
        }
    }
}
