use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use adminpanel_auth::Gate;

/// `gate:allow(userRole, requiredRole)`: render `body` only when allowed.
pub fn gate_allow(user_role: &str, required_role: &str, body: &str) -> String {
    if Gate::allow_names(user_role, required_role) {
        body.to_string()
    } else {
        String::new()
    }
}

/// `ifNotEmpty(value)`: whether a context value counts as present.
///
/// Booleans evaluate to themselves; strings, arrays and objects must be
/// non-empty; `null` is empty; numbers are present.
pub fn if_not_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Number(_)) => true,
    }
}

/// `timeSince(date, fallbackAfter, fallbackFormat)`.
///
/// Relative wording ("3 minutes ago") until `fallback_after` has passed,
/// then the absolute date in `fallback_format` (chrono syntax, default
/// `%Y-%m-%d`).
pub fn time_since(
    date: DateTime<Utc>,
    now: DateTime<Utc>,
    fallback_after: Option<Duration>,
    fallback_format: Option<&str>,
) -> String {
    let elapsed = now - date;

    if fallback_after.is_some_and(|limit| elapsed > limit) {
        return date.format(fallback_format.unwrap_or("%Y-%m-%d")).to_string();
    }

    let seconds = elapsed.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (amount, unit) = if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else if seconds < 86_400 * 30 {
        (seconds / 86_400, "day")
    } else if seconds < 86_400 * 365 {
        (seconds / (86_400 * 30), "month")
    } else {
        (seconds / (86_400 * 365), "year")
    };

    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn gate_allow_hides_body_for_lesser_roles() {
        assert_eq!(gate_allow("Admin", "User", "x"), "x");
        assert_eq!(gate_allow("User", "Admin", "x"), "");
        assert_eq!(gate_allow("nobody", "User", "x"), "");
    }

    #[test]
    fn if_not_empty_cases() {
        assert!(!if_not_empty(None));
        assert!(!if_not_empty(Some(&json!(null))));
        assert!(!if_not_empty(Some(&json!(""))));
        assert!(!if_not_empty(Some(&json!([]))));
        assert!(!if_not_empty(Some(&json!(false))));
        assert!(if_not_empty(Some(&json!("x"))));
        assert!(if_not_empty(Some(&json!([1]))));
        assert!(if_not_empty(Some(&json!(0))));
    }

    #[test]
    fn relative_wording() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        assert_eq!(time_since(now - Duration::seconds(5), now, None, None), "just now");
        assert_eq!(time_since(now - Duration::minutes(1), now, None, None), "1 minute ago");
        assert_eq!(time_since(now - Duration::hours(5), now, None, None), "5 hours ago");
        assert_eq!(time_since(now - Duration::days(3), now, None, None), "3 days ago");
    }

    #[test]
    fn falls_back_to_absolute_date() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let date = now - Duration::days(10);
        assert_eq!(
            time_since(date, now, Some(Duration::days(7)), None),
            "2024-04-30"
        );
        assert_eq!(
            time_since(date, now, Some(Duration::days(7)), Some("%d/%m")),
            "30/04"
        );
    }
}
