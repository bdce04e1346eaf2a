use plaza_common::model::user::BIO_MAX_LEN;
use time::{Duration, OffsetDateTime, macros::format_description};

/// Age of `created_at` as shown on post cards, e.g. "5m ago".
#[must_use]
pub fn relative_time(created_at: OffsetDateTime, now: OffsetDateTime) -> String {
    let age = now - created_at;

    if age < Duration::MINUTE {
        "Just now".to_owned()
    } else if age < Duration::HOUR {
        format!("{}m ago", age.whole_minutes())
    } else if age < Duration::DAY {
        format!("{}h ago", age.whole_hours())
    } else if age < Duration::WEEK {
        format!("{}d ago", age.whole_days())
    } else {
        calendar_date(created_at)
    }
}

fn calendar_date(time: OffsetDateTime) -> String {
    let date = time.date();
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Upper-cased first letter of a name for the avatar placeholder.
#[must_use]
pub fn avatar_initial(name: &str) -> String {
    name.chars().next().map_or_else(
        || "?".to_owned(),
        |initial| initial.to_uppercase().collect(),
    )
}

#[must_use]
pub fn bio_counter(bio: &str) -> String {
    format!("{}/{BIO_MAX_LEN}", bio.chars().count())
}

#[cfg(test)]
mod tests {
    use crate::format::{avatar_initial, bio_counter, relative_time};
    use time::{Duration, macros::datetime};

    #[test]
    fn relative_time_buckets() {
        let now = datetime!(2025-06-15 12:00 UTC);

        assert_eq!(relative_time(now - Duration::seconds(59), now), "Just now");
        assert_eq!(relative_time(now - Duration::seconds(60), now), "1m ago");
        assert_eq!(relative_time(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(relative_time(now - Duration::hours(5), now), "5h ago");
        assert_eq!(relative_time(now - Duration::days(6), now), "6d ago");
        assert_eq!(relative_time(now - Duration::days(7), now), "2025-06-08");
        assert_eq!(relative_time(now + Duration::minutes(3), now), "Just now");
    }

    #[test]
    fn avatar_and_counter() {
        assert_eq!(avatar_initial("ada"), "A");
        assert_eq!(avatar_initial(""), "?");
        assert_eq!(bio_counter("héllo"), "5/500");
    }
}
