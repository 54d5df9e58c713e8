use crate::calendar::{self, MonthView};
use crate::duration::Duration;
use crate::forms::{AdminFilterQuery, CreateEntryForm, FieldErrors, LoginForm, RegisterForm};
use crate::models::{AdminEntries, Category, CategoryTree, SummaryDay, TimeEntry, WeekdayHours};
use axum::http::StatusCode;
use chrono::{NaiveDate, Weekday};
use std::fmt::Write;

/// Outcome message shown above a page after a form post.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub ok: bool,
    pub text: String,
}

impl Flash {
    pub fn ok(text: impl Into<String>) -> Self {
        Self { ok: true, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { ok: false, text: text.into() }
    }
}

pub struct DayPage<'a> {
    pub date: NaiveDate,
    pub summary: &'a SummaryDay,
    pub categories: &'a [Category],
    pub form: &'a CreateEntryForm,
    pub errors: &'a FieldErrors,
    pub flash: Option<&'a Flash>,
    /// Where the create form posts to.
    pub create_action: &'a str,
}

pub fn render_login(
    form: &LoginForm,
    errors: &FieldErrors,
    flash: Option<&Flash>,
    redirect: Option<&str>,
) -> String {
    let action = match redirect {
        Some(path) => format!("/auth/login?redirect={}", escape(&urlencode(path))),
        None => "/auth/login".to_string(),
    };
    let body = format!(
        r#"<section class="card narrow">
  <h1>Log ind</h1>
  {flash}
  <form method="post" action="{action}">
    {email}
    {password}
    <button type="submit" class="btn-primary">Log ind</button>
  </form>
  <p class="subtitle">Ingen konto? <a href="/auth/register">Opret en</a></p>
</section>"#,
        flash = render_flash(flash),
        email = input_field("email", "Email", "email", &form.email, errors),
        password = input_field("password", "Adgangskode", "password", "", errors),
    );
    layout("Log ind", false, &body)
}

pub fn render_register(form: &RegisterForm, errors: &FieldErrors, flash: Option<&Flash>) -> String {
    let body = format!(
        r#"<section class="card narrow">
  <h1>Opret konto</h1>
  {flash}
  <form method="post" action="/auth/register">
    {name}
    {email}
    {password}
    <button type="submit" class="btn-primary">Opret</button>
  </form>
  <p class="subtitle">Har du en konto? <a href="/auth/login">Log ind</a></p>
</section>"#,
        flash = render_flash(flash),
        name = input_field("name", "Navn", "text", &form.name, errors),
        email = input_field("email", "Email", "email", &form.email, errors),
        password = input_field("password", "Adgangskode", "password", "", errors),
    );
    layout("Opret konto", false, &body)
}

pub fn render_day(page: &DayPage<'_>) -> String {
    let summary = page.summary;
    let date_key = calendar::date_key(page.date);
    let total = summary.total_hours.unwrap_or_default();
    let max = summary.max_hours.unwrap_or_default();

    let mut entries = String::new();
    if summary.time_entries.is_empty() {
        entries.push_str(r#"<p class="subtitle">Ingen registreringer endnu.</p>"#);
    }
    for entry in &summary.time_entries {
        entries.push_str(&render_entry(entry, &date_key));
    }

    let mut options = String::from(r#"<option value="-1">Vælg kategori</option>"#);
    for category in page.categories {
        let selected = if page.form.category_id == category.id.to_string() {
            " selected"
        } else {
            ""
        };
        let label = if category.root_title.is_empty() {
            category.title.clone()
        } else {
            format!("{} / {}", category.root_title, category.title)
        };
        let _ = write!(
            options,
            r#"<option value="{}"{selected}>{}</option>"#,
            category.id,
            escape(&label)
        );
    }

    let body = format!(
        r#"<header>
  <h1>{weekday} {date}</h1>
  <p class="subtitle">{total} af {max}</p>
</header>
{flash}
<section class="panel">
  <div class="stat"><span class="label">Registreret</span><span class="value">{total}</span></div>
  <div class="stat"><span class="label">Norm</span><span class="value">{max}</span></div>
</section>
<section class="card">
  <h2>Ny registrering</h2>
  <form method="post" action="{action}">
    <input type="hidden" name="date" value="{date}" />
    <label>Kategori<select name="categoryId">{options}</select></label>
    {category_error}
    {duration}
    {description}
    <button type="submit" class="btn-primary">Gem</button>
  </form>
</section>
<section class="card">
  <h2>Registreringer</h2>
  {entries}
</section>"#,
        weekday = escape(&calendar::translate_weekday(&summary.weekday)),
        date = escape(&date_key),
        total = total.to_display_string(),
        max = max.to_display_string(),
        flash = render_flash(page.flash),
        action = escape(page.create_action),
        options = options,
        category_error = field_error("categoryId", page.errors),
        duration = input_field(
            "durationHours",
            "Timer (fx 1,5 eller 1h30m)",
            "text",
            &page.form.duration_hours,
            page.errors
        ),
        description = input_field(
            "description",
            "Beskrivelse",
            "text",
            page.form.description.as_deref().unwrap_or(""),
            page.errors
        ),
        entries = entries,
    );
    layout("Dag", true, &body)
}

fn render_entry(entry: &TimeEntry, date_key: &str) -> String {
    let duration = entry.duration.unwrap_or_default();
    format!(
        r#"<article class="entry">
  <div><strong>{category}</strong> <span class="value">{display}</span></div>
  <p>{description}</p>
  <form method="post" action="/calendar/{date}/update" class="inline">
    <input type="hidden" name="id" value="{id}" />
    <input type="text" name="durationHours" value="{hours}" />
    <input type="text" name="description" value="{description}" />
    <button type="submit">Opdater</button>
  </form>
  <form method="post" action="/calendar/{date}/delete" class="inline">
    <input type="hidden" name="id" value="{id}" />
    <button type="submit" class="btn-danger">Slet</button>
  </form>
</article>"#,
        category = escape(&entry.category),
        display = duration.to_display_string(),
        description = escape(&entry.description),
        date = escape(date_key),
        id = entry.id,
        hours = duration.to_interop_string(),
    )
}

pub fn render_calendar(view: &MonthView) -> String {
    let mut head = String::from("<th></th>");
    for name in calendar::WEEKDAY_NAMES {
        let _ = write!(head, "<th>{name}</th>");
    }

    let mut rows = String::new();
    for week in &view.weeks {
        let _ = write!(rows, r#"<tr><th class="week">{}</th>"#, escape(&week.label));
        for day in &week.days {
            match day {
                None => rows.push_str(r#"<td class="empty"></td>"#),
                Some(day) => {
                    let mut class = String::from("day");
                    if day.is_today {
                        class.push_str(" today");
                    }
                    if day.target_met() {
                        class.push_str(" met");
                    }
                    let _ = write!(
                        rows,
                        r#"<td class="{class}"><a href="/calendar/{key}"><span class="num">{num}</span><span>{total}</span><span class="muted">{max}</span></a></td>"#,
                        key = calendar::date_key(day.date),
                        num = day.date.format("%-d"),
                        total = day.total.to_display_string(),
                        max = day.max.to_display_string(),
                    );
                }
            }
        }
        rows.push_str("</tr>");
    }

    let body = format!(
        r#"<header>
  <h1>{label}</h1>
  <p class="subtitle">{total} af {max}</p>
</header>
<nav class="tabs">
  <a class="tab" href="/calendar?month={previous}">&larr; {previous_label}</a>
  <a class="tab" href="/calendar?month={next}">{next_label} &rarr;</a>
</nav>
<table class="calendar">
  <thead><tr>{head}</tr></thead>
  <tbody>{rows}</tbody>
</table>"#,
        label = escape(&view.label),
        total = view.total.to_display_string(),
        max = view.max.to_display_string(),
        previous = calendar::month_key(view.previous),
        previous_label = calendar::month_label(view.previous),
        next = calendar::month_key(view.next),
        next_label = calendar::month_label(view.next),
    );
    layout("Kalender", true, &body)
}

pub fn render_profile(trees: &[CategoryTree], hours: &[WeekdayHours]) -> String {
    let mut tree_html = String::new();
    render_trees(trees, &mut tree_html);

    let mut hours_rows = String::new();
    let mut ordered: Vec<&WeekdayHours> = hours.iter().collect();
    // Backend counts from Sunday; the table starts on Monday.
    ordered.sort_by_key(|h| (h.weekday + 6) % 7);
    for day in ordered {
        let name = backend_weekday(day.weekday)
            .map(calendar::weekday_name)
            .unwrap_or("?");
        let _ = write!(
            hours_rows,
            "<tr><td>{name}</td><td>{}</td></tr>",
            day.hours.unwrap_or_default().to_display_string()
        );
    }

    let body = format!(
        r#"<header><h1>Min profil</h1></header>
<section class="card">
  <h2>Ugenorm</h2>
  <table>{hours_rows}</table>
</section>
<section class="card">
  <h2>Kategorier</h2>
  {tree_html}
</section>"#
    );
    layout("Profil", true, &body)
}

fn render_trees(trees: &[CategoryTree], out: &mut String) {
    if trees.is_empty() {
        return;
    }
    out.push_str(r#"<ul class="tree">"#);
    for tree in trees {
        let mut badges = String::new();
        if tree.is_followed {
            badges.push_str(r#" <span class="badge">følger</span>"#);
        }
        if tree.is_retired {
            badges.push_str(r#" <span class="badge muted">udgået</span>"#);
        }
        let _ = write!(out, "<li>{}{badges}", escape(&tree.title));
        render_trees(&tree.children, out);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

fn backend_weekday(index: i64) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn render_admin(query: &AdminFilterQuery, entries: &AdminEntries, errors: &FieldErrors) -> String {
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));

    let mut rows = String::new();
    for entry in &entries.entries {
        let _ = write!(
            rows,
            "<tr><td>{date}</td><td>{user}</td><td>{category}</td><td>{duration}</td><td>{description}</td></tr>",
            date = escape(&entry.date),
            user = entry.user_id,
            category = escape(&entry.category),
            duration = entry.duration.unwrap_or_default().to_display_string(),
            description = escape(&entry.description),
        );
    }
    let total: Duration = entries
        .time_spent
        .unwrap_or_else(|| entries.entries.iter().filter_map(|e| e.duration).sum());

    let body = format!(
        r#"<header>
  <h1>Administration</h1>
  <p class="subtitle">{count} registreringer, {total} i alt</p>
</header>
<section class="card">
  <form method="get" action="/admin" class="filters">
    <label>Søg<input type="text" name="query" value="{q}" /></label>
    <label>Kategorier<input type="text" name="categoryId" value="{cat}" /></label>
    {cat_err}
    <label>Brugere<input type="text" name="userId" value="{user}" /></label>
    {user_err}
    <label>Fra<input type="date" name="fromDate" value="{from}" /></label>
    {from_err}
    <label>Til<input type="date" name="toDate" value="{to}" /></label>
    {to_err}
    <button type="submit" class="btn-primary">Filtrer</button>
  </form>
</section>
<table class="entries">
  <thead><tr><th>Dato</th><th>Bruger</th><th>Kategori</th><th>Tid</th><th>Beskrivelse</th></tr></thead>
  <tbody>{rows}</tbody>
</table>"#,
        count = entries.entries.len(),
        total = total.to_display_string(),
        q = value(&query.query),
        cat = value(&query.category_id),
        user = value(&query.user_id),
        from = value(&query.from_date),
        to = value(&query.to_date),
        cat_err = field_error("categoryId", errors),
        user_err = field_error("userId", errors),
        from_err = field_error("fromDate", errors),
        to_err = field_error("toDate", errors),
    );
    layout("Administration", true, &body)
}

pub fn render_error(status: StatusCode, message: &str) -> String {
    let body = format!(
        r#"<section class="card narrow">
  <h1>{code}</h1>
  <p class="status error">{message}</p>
  <p><a href="/">Til forsiden</a></p>
</section>"#,
        code = status.as_u16(),
        message = escape(message),
    );
    layout("Fejl", false, &body)
}

fn render_flash(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => format!(
            r#"<p class="status {}">{}</p>"#,
            if flash.ok { "ok" } else { "error" },
            escape(&flash.text)
        ),
        None => String::new(),
    }
}

fn input_field(name: &'static str, label: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<label>{label}<input type="{kind}" name="{name}" value="{value}" /></label>{error}"#,
        value = escape(value),
        error = field_error(name, errors),
    )
}

fn field_error(name: &str, errors: &FieldErrors) -> String {
    errors
        .get(name)
        .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
        .unwrap_or_default()
}

fn layout(title: &str, nav: bool, body: &str) -> String {
    let nav = if nav { NAV_HTML } else { "" };
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", nav)
        .replace("{{BODY}}", body)
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn urlencode(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

const NAV_HTML: &str = r#"<nav class="navbar">
    <a class="title" href="/">Tidsregistrering</a>
    <a href="/">I dag</a>
    <a href="/calendar">Kalender</a>
    <a href="/me">Profil</a>
    <a href="/admin">Admin</a>
    <a href="/auth/logout">Log ud</a>
  </nav>"#;

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="da">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 24px 18px 48px;
    }

    main {
      width: min(960px, 100%);
      margin: 0 auto;
      display: grid;
      gap: 24px;
    }

    .navbar {
      display: flex;
      flex-wrap: wrap;
      gap: 16px;
      align-items: center;
    }

    .navbar .title {
      font-weight: 600;
      margin-right: auto;
    }

    a {
      color: var(--accent-2);
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 24px;
      display: grid;
      gap: 12px;
    }

    .card.narrow {
      width: min(420px, 100%);
      margin: 0 auto;
    }

    .panel {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .stat {
      background: white;
      border-radius: 18px;
      padding: 18px;
      display: grid;
      gap: 8px;
    }

    .label {
      font-size: 0.85rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #8b857d;
    }

    .value {
      font-weight: 600;
      color: var(--accent-2);
    }

    .subtitle, .muted {
      color: #5f5c57;
    }

    form {
      display: grid;
      gap: 10px;
    }

    form.inline {
      display: inline-flex;
    }

    label {
      display: grid;
      gap: 4px;
    }

    input, select {
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      font-weight: 600;
      cursor: pointer;
    }

    .btn-primary {
      background: var(--accent);
      color: white;
    }

    .btn-danger {
      background: var(--accent-2);
      color: white;
    }

    .field-error, .status.error {
      color: #b3261e;
    }

    .status.ok {
      color: #1e7b34;
    }

    .tabs {
      display: flex;
      justify-content: space-between;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    .calendar td {
      background: white;
      border: 1px solid rgba(47, 72, 88, 0.08);
      vertical-align: top;
      height: 72px;
    }

    .calendar td a {
      display: grid;
      padding: 6px;
      text-decoration: none;
    }

    .calendar td.today {
      outline: 2px solid var(--accent);
    }

    .calendar td.met {
      background: #eaf6ec;
    }

    .calendar td.empty {
      background: transparent;
    }

    .badge {
      font-size: 0.75rem;
      padding: 2px 6px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.08);
    }
  </style>
</head>
<body>
  {{NAV}}
  <main>
{{BODY}}
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape(r#"<b a="1">&'"#), "&lt;b a=&quot;1&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn day_page_shows_display_durations() {
        let summary: SummaryDay = serde_json::from_str(
            r#"{"date":"2026-01-05","weekday":"Monday","totalHours":"1h30m0s","maxHours":"7h30m0s",
                "timeEntries":[{"id":9,"categoryId":2,"category":"Support","userId":1,
                "date":"2026-01-05","duration":"1h30m0s","description":"<calls>"}]}"#,
        )
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let form = CreateEntryForm::for_date(date);
        let errors = FieldErrors::new();
        let html = render_day(&DayPage {
            date,
            summary: &summary,
            categories: &[],
            form: &form,
            errors: &errors,
            flash: Some(&Flash::ok("Created Time Entry")),
            create_action: "/calendar/2026-01-05/create",
        });
        assert!(html.contains("Mandag 2026-01-05"));
        assert!(html.contains("1t 30m af 7t 30m"));
        assert!(html.contains("&lt;calls&gt;"));
        assert!(html.contains(r#"value="1h30m0s""#));
        assert!(html.contains("Created Time Entry"));
    }

    #[test]
    fn login_page_keeps_redirect_and_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("password", "must be between 8 and 32 characters".into());
        let html = render_login(&LoginForm::default(), &errors, None, Some("/admin"));
        assert!(html.contains(r#"action="/auth/login?redirect=%2Fadmin""#));
        assert!(html.contains("must be between 8 and 32 characters"));
        assert!(!html.contains("navbar"));
    }

    #[test]
    fn profile_orders_hours_from_monday() {
        let hours = vec![
            WeekdayHours { weekday: 0, hours: None },
            WeekdayHours { weekday: 1, hours: Some(Duration::from_nanos(27_000_000_000_000)) },
        ];
        let html = render_profile(&[], &hours);
        let monday = html.find("Mandag").unwrap();
        let sunday = html.find("Søndag").unwrap();
        assert!(monday < sunday);
        assert!(html.contains("7t 30m"));
    }
}
