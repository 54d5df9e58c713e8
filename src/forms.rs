//! Form payloads posted by the pages, and their validation.

use crate::api::EntryFilters;
use crate::duration::{self, Duration, HOUR};
use crate::models::{RegisterTimeEntryInput, UpdateTimeEntryInput};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Messages keyed by the form field they belong to.
pub type FieldErrors = BTreeMap<&'static str, String>;

const MAX_ENTRY: Duration = Duration::from_nanos(24 * HOUR.as_nanos());

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        finish((), errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_length("name", self.name.trim(), 3, 50, &mut errors);
        check_email(&self.email, &mut errors);
        check_password(&self.password, &mut errors);
        finish((), errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryForm {
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub duration_hours: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateEntryForm {
    /// A blank form for `date` with no category chosen.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            category_id: "-1".to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            duration_hours: "0".to_string(),
            description: None,
        }
    }

    pub fn validate(&self) -> Result<RegisterTimeEntryInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let category_id = match self.category_id.trim().parse::<i64>() {
            Ok(id) if id > 0 => Some(id),
            _ => {
                errors.insert("categoryId", "choose a category".to_string());
                None
            }
        };
        let date = match parse_date(&self.date) {
            Some(date) => Some(date),
            None => {
                errors.insert("date", "date must be YYYY-MM-DD".to_string());
                None
            }
        };
        let duration = field(parse_entry_duration(&self.duration_hours), "durationHours", &mut errors);

        match (category_id, date, duration) {
            (Some(category_id), Some(date), Some(duration)) if errors.is_empty() => {
                Ok(RegisterTimeEntryInput {
                    category_id,
                    date: date.format("%Y-%m-%d").to_string(),
                    duration,
                    description: self.description.clone().unwrap_or_default(),
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntryForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub duration_hours: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl UpdateEntryForm {
    pub fn validate(&self) -> Result<(i64, UpdateTimeEntryInput), FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = field(parse_id(&self.id), "id", &mut errors);
        let duration = field(parse_entry_duration(&self.duration_hours), "durationHours", &mut errors);
        match (id, duration) {
            (Some(id), Some(duration)) => Ok((
                id,
                UpdateTimeEntryInput {
                    duration,
                    description: self.description.clone().unwrap_or_default(),
                },
            )),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteEntryForm {
    #[serde(default)]
    pub id: String,
}

impl DeleteEntryForm {
    pub fn validate(&self) -> Result<i64, FieldErrors> {
        let mut errors = FieldErrors::new();
        let id = field(parse_id(&self.id), "id", &mut errors);
        id.ok_or(errors)
    }
}

/// Query string of the admin listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFilterQuery {
    pub query: Option<String>,
    pub category_id: Option<String>,
    pub user_id: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

impl AdminFilterQuery {
    pub fn validate(&self) -> Result<EntryFilters, FieldErrors> {
        let mut errors = FieldErrors::new();
        let query = non_blank(&self.query).map(str::to_string);
        let category_ids = field(parse_id_list(&self.category_id), "categoryId", &mut errors);
        let user_ids = field(parse_id_list(&self.user_id), "userId", &mut errors);
        let from_date = field(parse_optional_date(&self.from_date), "fromDate", &mut errors);
        let to_date = field(parse_optional_date(&self.to_date), "toDate", &mut errors);

        if let (Some(Some(from)), Some(Some(to))) = (from_date, to_date) {
            if from > to {
                errors.insert("fromDate", "from date cannot be after to date".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(EntryFilters {
            query,
            category_ids: category_ids.unwrap_or_default(),
            user_ids: user_ids.unwrap_or_default(),
            from_date: from_date.flatten(),
            to_date: to_date.flatten(),
        })
    }
}

/// Reads the duration field of an entry form. Accepts decimal hours (`1.5`
/// or `1,5`), the interop form (`1h30m`) or the display form (`1t 30m`).
pub fn parse_entry_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("duration is required".to_string());
    }

    let parsed = match raw.replace(',', ".").parse::<f64>() {
        Ok(hours) if hours.is_finite() => Some(Duration::from_hours_f64(hours)),
        Ok(_) => None,
        Err(_) if raw.contains('t') => duration::parse_duration(&duration::display_to_interop(raw)),
        Err(_) => duration::parse_duration(raw),
    };

    match parsed {
        Some(d) if d > Duration::ZERO && d <= MAX_ENTRY => Ok(d),
        Some(_) => Err("duration must be more than 0 and at most 24 hours".to_string()),
        None => Err("enter hours like 1.5 or a duration like 1h30m".to_string()),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_optional_date(raw: &Option<String>) -> Result<Option<NaiveDate>, String> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => parse_date(value)
            .map(Some)
            .ok_or_else(|| "date must be YYYY-MM-DD".to_string()),
    }
}

fn parse_id(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err("invalid id".to_string()),
    }
}

fn parse_id_list(raw: &Option<String>) -> Result<Vec<i64>, String> {
    let Some(value) = non_blank(raw) else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_id)
        .collect()
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn field<T>(result: Result<T, String>, name: &'static str, errors: &mut FieldErrors) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.insert(name, message);
            None
        }
    }
}

fn finish<T>(value: T, errors: FieldErrors) -> Result<T, FieldErrors> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

fn check_email(email: &str, errors: &mut FieldErrors) {
    let valid = email.trim().split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });
    if !valid {
        errors.insert("email", "enter a valid email address".to_string());
    }
}

fn check_password(password: &str, errors: &mut FieldErrors) {
    check_length("password", password, 8, 32, errors);
}

fn check_length(name: &'static str, value: &str, min: usize, max: usize, errors: &mut FieldErrors) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.insert(name, format!("must be between {min} and {max} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::MINUTE;

    fn entry(category: &str, date: &str, hours: &str) -> CreateEntryForm {
        CreateEntryForm {
            category_id: category.into(),
            date: date.into(),
            duration_hours: hours.into(),
            description: Some("standup".into()),
        }
    }

    #[test]
    fn login_requires_email_and_password_length() {
        let form = LoginForm {
            email: "ada@example.com".into(),
            password: "correct-horse".into(),
        };
        assert!(form.validate().is_ok());

        let errors = LoginForm {
            email: "ada".into(),
            password: "short".into(),
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("password"));
    }

    #[test]
    fn register_checks_name_length() {
        let form = RegisterForm {
            name: "Al".into(),
            email: "al@example.com".into(),
            password: "12345678".into(),
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("name"));
    }

    #[test]
    fn entry_duration_accepts_hours_and_duration_strings() {
        let ninety = Duration::from_nanos(90 * MINUTE.as_nanos());
        assert_eq!(parse_entry_duration("1.5"), Ok(ninety));
        assert_eq!(parse_entry_duration("1,5"), Ok(ninety));
        assert_eq!(parse_entry_duration("1h30m"), Ok(ninety));
        assert_eq!(parse_entry_duration("1t 30m"), Ok(ninety));
        assert!(parse_entry_duration("0").is_err());
        assert!(parse_entry_duration("25").is_err());
        assert!(parse_entry_duration("soon").is_err());
        assert!(parse_entry_duration("NaN").is_err());
        assert!(parse_entry_duration("").is_err());
    }

    #[test]
    fn create_entry_builds_backend_input() {
        let input = entry("3", "2026-01-05", "2").validate().unwrap();
        assert_eq!(input.category_id, 3);
        assert_eq!(input.date, "2026-01-05");
        assert_eq!(input.duration.to_interop_string(), "2h0m0s");
        assert_eq!(input.description, "standup");
    }

    #[test]
    fn create_entry_reports_every_bad_field() {
        let errors = CreateEntryForm::for_date(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap())
            .validate()
            .unwrap_err();
        assert!(errors.contains_key("categoryId"));
        assert!(errors.contains_key("durationHours"));
        assert!(!errors.contains_key("date"));

        let errors = entry("3", "05-01-2026", "1").validate().unwrap_err();
        assert_eq!(errors.keys().copied().collect::<Vec<_>>(), vec!["date"]);
    }

    #[test]
    fn update_and_delete_need_ids() {
        let form = UpdateEntryForm {
            id: "12".into(),
            duration_hours: "0.75".into(),
            description: None,
        };
        let (id, input) = form.validate().unwrap();
        assert_eq!(id, 12);
        assert_eq!(input.duration.to_interop_string(), "0h45m0s");
        assert_eq!(input.description, "");

        assert!(DeleteEntryForm { id: "x".into() }.validate().is_err());
        assert_eq!(DeleteEntryForm { id: "7".into() }.validate(), Ok(7));
    }

    #[test]
    fn admin_filters_parse_lists_and_dates() {
        let query = AdminFilterQuery {
            query: Some("  ".into()),
            category_id: Some("1,,4".into()),
            user_id: None,
            from_date: Some("2026-01-01".into()),
            to_date: Some("2026-01-31".into()),
        };
        let filters = query.validate().unwrap();
        assert_eq!(filters.query, None);
        assert_eq!(filters.category_ids, vec![1, 4]);
        assert!(filters.user_ids.is_empty());
        assert_eq!(filters.from_date, NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn admin_filters_reject_reversed_range() {
        let query = AdminFilterQuery {
            from_date: Some("2026-02-01".into()),
            to_date: Some("2026-01-01".into()),
            ..Default::default()
        };
        let errors = query.validate().unwrap_err();
        assert!(errors.contains_key("fromDate"));

        let query = AdminFilterQuery {
            user_id: Some("1,abc".into()),
            ..Default::default()
        };
        assert!(query.validate().unwrap_err().contains_key("userId"));
    }
}
