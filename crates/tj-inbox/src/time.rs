use chrono::{DateTime, Utc};

/// Short age label for a notification timestamp.
#[must_use]
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(at);
    let minutes = age.num_minutes();
    if minutes < 1 {
        return "Just now".into();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = age.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    at.format("%-m/%-d/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;

    #[rstest]
    #[case(TimeDelta::seconds(30), "Just now")]
    #[case(TimeDelta::seconds(-90), "Just now")]
    #[case(TimeDelta::minutes(1), "1m ago")]
    #[case(TimeDelta::minutes(59), "59m ago")]
    #[case(TimeDelta::minutes(60), "1h ago")]
    #[case(TimeDelta::hours(23), "23h ago")]
    #[case(TimeDelta::hours(30), "3/4/2026")]
    fn labels(#[case] age: TimeDelta, #[case] expected: &str) {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(relative_time(now - age, now), expected);
    }
}
