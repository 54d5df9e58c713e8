use crate::duration::Duration;
use crate::models::SummaryMonth;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// Weekday names, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Mandag", "Tirsdag", "Onsdag", "Torsdag", "Fredag", "Lørdag", "Søndag",
];

pub const MONTH_NAMES: [&str; 12] = [
    "Januar", "Februar", "Marts", "April", "Maj", "Juni", "Juli", "August", "September",
    "Oktober", "November", "December",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub total: Duration,
    pub max: Duration,
    pub entry_count: usize,
    pub is_today: bool,
}

impl CalendarDay {
    /// True when the day has a target and the logged time reaches it.
    pub fn target_met(&self) -> bool {
        !self.max.is_zero() && self.total >= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarWeek {
    pub label: String,
    /// Monday to Sunday; `None` for days outside the month.
    pub days: Vec<Option<CalendarDay>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthView {
    pub month: NaiveDate,
    pub label: String,
    pub total: Duration,
    pub max: Duration,
    pub previous: NaiveDate,
    pub next: NaiveDate,
    pub weeks: Vec<CalendarWeek>,
}

pub fn build_month_view(month: NaiveDate, summary: &SummaryMonth, today: NaiveDate) -> MonthView {
    let month = month_start(month);
    let following = month.checked_add_months(Months::new(1));
    let last_day = following.and_then(|d| d.pred_opt()).unwrap_or(NaiveDate::MAX);
    let next = following.unwrap_or(month);
    let previous = month.checked_sub_months(Months::new(1)).unwrap_or(month);

    let days_by_date: BTreeMap<&str, _> = summary
        .days
        .iter()
        .map(|day| (day.date.as_str(), day))
        .collect();

    // Offsets are relative to the 1st; the first row starts on the Monday before it.
    let mut week_offset = -i64::from(month.weekday().num_days_from_monday());
    let mut weeks = Vec::new();
    loop {
        let mut days = Vec::with_capacity(7);
        let mut label = None;
        for day_offset in week_offset..week_offset + 7 {
            let Some(date) = shift_days(month, day_offset).filter(|d| *d >= month && *d <= last_day)
            else {
                days.push(None);
                continue;
            };
            label.get_or_insert_with(|| week_label(date));
            let summary_day = days_by_date.get(date_key(date).as_str());
            days.push(Some(CalendarDay {
                date,
                total: summary_day.and_then(|d| d.total_hours).unwrap_or_default(),
                max: summary_day.and_then(|d| d.max_hours).unwrap_or_default(),
                entry_count: summary_day.map_or(0, |d| d.time_entries.len()),
                is_today: date == today,
            }));
        }
        let Some(label) = label else {
            break;
        };
        weeks.push(CalendarWeek { label, days });
        week_offset += 7;
    }

    MonthView {
        month,
        label: month_label(month),
        total: summary.total_hours.unwrap_or_default(),
        max: summary.max_hours.unwrap_or_default(),
        previous,
        next,
        weeks,
    }
}

/// Parses `YYYY-MM` into the first day of that month.
/// Years outside 1..=9999 are rejected.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .ok()
        .filter(|date| (1..=9999).contains(&date.year()))
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn month_key(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

pub fn month_label(month: NaiveDate) -> String {
    format!("{} {}", MONTH_NAMES[month.month0() as usize], month.year())
}

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES[day.num_days_from_monday() as usize]
}

/// Localises the English weekday name the backend sends.
pub fn translate_weekday(english: &str) -> String {
    english
        .parse::<Weekday>()
        .map(|day| weekday_name(day).to_string())
        .unwrap_or_else(|_| english.to_string())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let step = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(step)
    } else {
        date.checked_add_days(step)
    }
}

fn week_label(date: NaiveDate) -> String {
    format!("Uge {}", date.iso_week().week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::HOUR;
    use crate::models::SummaryDay;

    fn summary(days: Vec<SummaryDay>) -> SummaryMonth {
        SummaryMonth {
            month: "2026-01".into(),
            total_hours: Some(Duration::from_nanos(3 * HOUR.as_nanos())),
            max_hours: Some(Duration::from_nanos(165 * HOUR.as_nanos())),
            days,
        }
    }

    fn day(date: &str, hours: i64) -> SummaryDay {
        SummaryDay {
            date: date.into(),
            weekday: "Monday".into(),
            total_hours: Some(Duration::from_nanos(hours * HOUR.as_nanos())),
            max_hours: Some(Duration::from_nanos(3 * HOUR.as_nanos())),
            time_entries: Vec::new(),
        }
    }

    #[test]
    fn month_grid_covers_every_day_in_monday_weeks() {
        let month = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let view = build_month_view(month, &summary(vec![day("2026-01-05", 3)]), today);

        // 1 January 2026 is a Thursday; the grid spans five ISO weeks.
        assert_eq!(view.weeks.len(), 5);
        assert!(view.weeks.iter().all(|week| week.days.len() == 7));
        assert_eq!(view.weeks[0].days.iter().filter(|d| d.is_none()).count(), 3);
        let filled: usize = view
            .weeks
            .iter()
            .map(|week| week.days.iter().flatten().count())
            .sum();
        assert_eq!(filled, 31);

        let monday = view.weeks[1].days[0].as_ref().expect("missing day");
        assert_eq!(monday.date, today);
        assert!(monday.is_today);
        assert!(monday.target_met());
        assert_eq!(view.weeks[1].label, "Uge 2");
    }

    #[test]
    fn month_navigation_and_labels() {
        let view = build_month_view(
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
            &summary(Vec::new()),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        );
        assert_eq!(view.month, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(view.previous, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(view.next, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(view.label, "Januar 2026");
        assert_eq!(view.total.to_display_string(), "3t 0m");
    }

    #[test]
    fn parses_months_and_weekdays() {
        assert_eq!(parse_month("2026-02"), NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(parse_month("2026-13"), None);
        assert_eq!(translate_weekday("Saturday"), "Lørdag");
        assert_eq!(translate_weekday("someday"), "someday");
        assert_eq!(weekday_name(Weekday::Sun), "Søndag");
    }

    #[test]
    fn month_query_rejects_years_outside_the_calendar() {
        assert_eq!(parse_month("-262143-01"), None);
        assert_eq!(parse_month("0000-12"), None);
        assert_eq!(parse_month("10000-01"), None);
        assert_eq!(parse_month("9999-12"), NaiveDate::from_ymd_opt(9999, 12, 1));
        assert_eq!(parse_month("0001-01"), NaiveDate::from_ymd_opt(1, 1, 1));
    }

    #[test]
    fn grid_stays_inside_the_date_range() {
        // The Monday before the first representable day does not exist.
        let first = build_month_view(NaiveDate::MIN, &summary(Vec::new()), NaiveDate::MIN);
        let lead = NaiveDate::MIN.weekday().num_days_from_monday() as usize;
        assert_eq!(first.weeks[0].days.iter().filter(|d| d.is_none()).count(), lead);
        let filled: usize = first.weeks.iter().map(|w| w.days.iter().flatten().count()).sum();
        assert_eq!(filled, 31);
        assert_eq!(first.previous, first.month);

        let last_month = month_start(NaiveDate::MAX);
        let last = build_month_view(last_month, &summary(Vec::new()), last_month);
        let filled: usize = last.weeks.iter().map(|w| w.days.iter().flatten().count()).sum();
        assert_eq!(filled, 31);
        assert_eq!(last.next, last_month);
        assert!(last.weeks.iter().all(|week| week.days.len() == 7));
    }
}
