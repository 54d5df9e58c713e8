use crate::duration::{deserialize_lenient, Duration};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
}

/// A leaf category a time entry can be registered against.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub root_title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTree {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub is_retired: bool,
    #[serde(default)]
    pub is_followed: bool,
    #[serde(default)]
    pub children: Vec<CategoryTree>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub category: String,
    pub user_id: i64,
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDay {
    pub date: String,
    pub weekday: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub total_hours: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub max_hours: Option<Duration>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMonth {
    pub month: String,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub total_hours: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub max_hours: Option<Duration>,
    #[serde(default)]
    pub days: Vec<SummaryDay>,
}

/// Target hours for one weekday (0 = Sunday, as the backend counts).
#[derive(Debug, Clone, Deserialize)]
pub struct WeekdayHours {
    pub weekday: i64,
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub hours: Option<Duration>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEntries {
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub time_spent: Option<Duration>,
    #[serde(default)]
    pub entries: Vec<TimeEntry>,
}

#[derive(Debug, Serialize)]
pub struct LoginInput<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTimeEntryInput {
    pub category_id: i64,
    pub date: String,
    pub duration: Duration,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTimeEntryInput {
    pub duration: Duration,
    pub description: String,
}

/// The error body every backend failure carries.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::{HOUR, MINUTE};

    #[test]
    fn summary_day_decodes_backend_json() {
        let json = r#"{
            "date": "2026-01-05",
            "weekday": "Monday",
            "totalHours": "1h30m0s",
            "maxHours": "7h30m0s",
            "timeEntries": [{
                "id": 4, "categoryId": 2, "category": "Support", "userId": 1,
                "date": "2026-01-05", "duration": "1h30m0s", "description": "calls"
            }]
        }"#;
        let day: SummaryDay = serde_json::from_str(json).unwrap();
        assert_eq!(day.total_hours, Some(HOUR + Duration::from_nanos(30 * MINUTE.as_nanos())));
        assert_eq!(day.time_entries.len(), 1);
        assert_eq!(day.time_entries[0].duration, day.total_hours);
    }

    #[test]
    fn entry_input_sends_interop_duration() {
        let input = RegisterTimeEntryInput {
            category_id: 3,
            date: "2026-01-05".into(),
            duration: Duration::from_hours_f64(1.5),
            description: String::new(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["duration"], "1h30m0s");
        assert_eq!(value["categoryId"], 3);
    }

    #[test]
    fn category_tree_nests_children() {
        let json = r#"{"id":1,"parentId":null,"title":"Work","isRetired":false,"isFollowed":true,
            "children":[{"id":2,"parentId":1,"title":"Support","isRetired":true,"isFollowed":false,"children":[]}]}"#;
        let tree: CategoryTree = serde_json::from_str(json).unwrap();
        assert_eq!(tree.children[0].parent_id, Some(1));
        assert!(tree.children[0].is_retired);
    }
}
