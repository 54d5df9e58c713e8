use crate::calendar::{self, build_month_view, parse_month};
use crate::errors::AppError;
use crate::forms::{
    parse_date, AdminFilterQuery, CreateEntryForm, DeleteEntryForm, FieldErrors, LoginForm,
    RegisterForm, UpdateEntryForm,
};
use crate::models::{AdminEntries, LoginInput, RegisterInput};
use crate::session::{self, AuthToken};
use crate::state::AppState;
use crate::ui::{self, DayPage, Flash};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::{error, info};

#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn login_page(Query(query): Query<RedirectQuery>) -> Html<String> {
    Html(ui::render_login(
        &LoginForm::default(),
        &FieldErrors::new(),
        None,
        query.redirect.as_deref(),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<RedirectQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    let redirect = query.redirect.as_deref();
    if let Err(errors) = form.validate() {
        let html = ui::render_login(&form, &errors, None, redirect);
        return (StatusCode::BAD_REQUEST, Html(html)).into_response();
    }

    let input = LoginInput {
        email: form.email.trim(),
        password: &form.password,
    };
    match state.api.log_in(&input).await {
        Ok(issued) => {
            info!(user_id = issued.user_id, "logged in");
            logged_in(&issued.token, session::after_login(redirect))
        }
        Err(err) => {
            error!("login failed: {err}");
            let flash = Flash::error(err.to_string());
            let html = ui::render_login(&form, &FieldErrors::new(), Some(&flash), redirect);
            (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
        }
    }
}

pub async fn register_page() -> Html<String> {
    Html(ui::render_register(
        &RegisterForm::default(),
        &FieldErrors::new(),
        None,
    ))
}

pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    if let Err(errors) = form.validate() {
        let html = ui::render_register(&form, &errors, None);
        return (StatusCode::BAD_REQUEST, Html(html)).into_response();
    }

    let email = form.email.trim();
    let registered = state
        .api
        .register(&RegisterInput {
            name: form.name.trim(),
            email,
            password: &form.password,
        })
        .await;
    if let Err(err) = registered {
        error!("registration failed: {err}");
        return register_failed(&form, err.to_string());
    }

    let input = LoginInput {
        email,
        password: &form.password,
    };
    match state.api.log_in(&input).await {
        Ok(issued) => {
            info!(user_id = issued.user_id, "registered and logged in");
            logged_in(&issued.token, session::after_login(None))
        }
        Err(err) => {
            error!("login after registration failed: {err}");
            register_failed(&form, err.to_string())
        }
    }
}

fn register_failed(form: &RegisterForm, message: String) -> Response {
    let flash = Flash::error(message);
    let html = ui::render_register(form, &FieldErrors::new(), Some(&flash));
    (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
}

fn logged_in(token: &str, location: &str) -> Response {
    (
        [(header::SET_COOKIE, session::session_cookie(token))],
        Redirect::to(location),
    )
        .into_response()
}

pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, session::CLEAR_COOKIE)],
        Redirect::temporary("/auth/login"),
    )
        .into_response()
}

pub async fn today(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let date = today_date();
    let flash = notice_flash(query.notice.as_deref());
    day_page(&state, &token, DayView::new("/", date), flash).await
}

pub async fn create_today(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Form(form): Form<CreateEntryForm>,
) -> Result<Response, AppError> {
    let date = today_date();
    create_entry_for(&state, &token, DayView::new("/", date), form).await
}

pub async fn day(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(raw_date): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let date = path_date(&raw_date)?;
    let flash = notice_flash(query.notice.as_deref());
    day_page(&state, &token, DayView::calendar(date), flash).await
}

pub async fn create_entry(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(raw_date): Path<String>,
    Form(form): Form<CreateEntryForm>,
) -> Result<Response, AppError> {
    let date = path_date(&raw_date)?;
    create_entry_for(&state, &token, DayView::calendar(date), form).await
}

pub async fn update_entry(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(raw_date): Path<String>,
    Form(form): Form<UpdateEntryForm>,
) -> Result<Response, AppError> {
    let date = path_date(&raw_date)?;
    let view = DayView::calendar(date);
    let (id, input) = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => return rejected(&state, &token, view, &errors).await,
    };

    match state.api.update_time_entry(id, &input, &token).await {
        Ok(entry) => {
            info!(entry_id = entry.id, "updated time entry");
            Ok(view.redirect_with_notice("updated"))
        }
        Err(err) if err.is_unauthorized() => Err(AppError::backend(err, &view.page_path)),
        Err(err) => backend_failed(&state, &token, view, err.to_string()).await,
    }
}

pub async fn delete_entry(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(raw_date): Path<String>,
    Form(form): Form<DeleteEntryForm>,
) -> Result<Response, AppError> {
    let date = path_date(&raw_date)?;
    let view = DayView::calendar(date);
    let id = match form.validate() {
        Ok(id) => id,
        Err(errors) => return rejected(&state, &token, view, &errors).await,
    };

    match state.api.delete_time_entry(id, &token).await {
        Ok(()) => {
            info!(entry_id = id, "deleted time entry");
            Ok(view.redirect_with_notice("deleted"))
        }
        Err(err) if err.is_unauthorized() => Err(AppError::backend(err, &view.page_path)),
        Err(err) => backend_failed(&state, &token, view, err.to_string()).await,
    }
}

pub async fn calendar(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(query): Query<MonthQuery>,
) -> Result<Html<String>, AppError> {
    let today = today_date();
    let month = match query.month.as_deref() {
        Some(raw) => parse_month(raw)
            .ok_or_else(|| AppError::bad_request(format!("invalid month '{raw}', expected YYYY-MM")))?,
        None => calendar::month_start(today),
    };

    let summary = state
        .api
        .summary_for_month(month, &token)
        .await
        .map_err(|err| AppError::backend(err, "/calendar"))?;

    let view = build_month_view(month, &summary, today);
    Ok(Html(ui::render_calendar(&view)))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
) -> Result<Html<String>, AppError> {
    let (trees, hours) = tokio::join!(
        state.api.category_trees(&token),
        state.api.weekly_hours(&token)
    );
    let trees = trees.map_err(|err| AppError::backend(err, "/me"))?;
    let hours = hours.map_err(|err| AppError::backend(err, "/me"))?;
    Ok(Html(ui::render_profile(&trees, &hours)))
}

pub async fn admin(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(query): Query<AdminFilterQuery>,
) -> Result<Response, AppError> {
    let filters = match query.validate() {
        Ok(filters) => filters,
        Err(errors) => {
            let empty = AdminEntries {
                time_spent: None,
                entries: Vec::new(),
            };
            let html = ui::render_admin(&query, &empty, &errors);
            return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
        }
    };

    let entries = state
        .api
        .admin_entries(&filters, &token)
        .await
        .map_err(|err| AppError::backend(err, "/admin"))?;
    Ok(Html(ui::render_admin(&query, &entries, &FieldErrors::new())).into_response())
}

/// Which day page is being served and where its forms post.
struct DayView {
    date: NaiveDate,
    page_path: String,
    create_action: String,
}

impl DayView {
    fn new(page_path: &str, date: NaiveDate) -> Self {
        let create_action = page_path.to_string();
        Self {
            date,
            page_path: page_path.to_string(),
            create_action,
        }
    }

    fn calendar(date: NaiveDate) -> Self {
        let page_path = format!("/calendar/{}", calendar::date_key(date));
        Self {
            date,
            create_action: format!("{page_path}/create"),
            page_path,
        }
    }

    fn redirect_with_notice(&self, notice: &str) -> Response {
        Redirect::to(&format!("{}?notice={notice}", self.page_path)).into_response()
    }
}

async fn create_entry_for(
    state: &AppState,
    token: &str,
    view: DayView,
    form: CreateEntryForm,
) -> Result<Response, AppError> {
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return render_day(state, token, &view, &form, &errors, None, StatusCode::BAD_REQUEST)
                .await;
        }
    };

    match state.api.create_time_entry(&input, token).await {
        Ok(entry) => {
            info!(entry_id = entry.id, date = %entry.date, "created time entry");
            Ok(view.redirect_with_notice("created"))
        }
        Err(err) if err.is_unauthorized() => Err(AppError::backend(err, &view.page_path)),
        Err(err) => {
            error!("creating time entry failed: {err}");
            let flash = Flash::error(err.to_string());
            render_day(
                state,
                token,
                &view,
                &form,
                &FieldErrors::new(),
                Some(&flash),
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .await
        }
    }
}

async fn day_page(
    state: &AppState,
    token: &str,
    view: DayView,
    flash: Option<Flash>,
) -> Result<Response, AppError> {
    let form = CreateEntryForm::for_date(view.date);
    render_day(state, token, &view, &form, &FieldErrors::new(), flash.as_ref(), StatusCode::OK).await
}

async fn rejected(
    state: &AppState,
    token: &str,
    view: DayView,
    errors: &FieldErrors,
) -> Result<Response, AppError> {
    let message = errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join(", ");
    let flash = Flash::error(message);
    let form = CreateEntryForm::for_date(view.date);
    render_day(
        state,
        token,
        &view,
        &form,
        &FieldErrors::new(),
        Some(&flash),
        StatusCode::BAD_REQUEST,
    )
    .await
}

async fn backend_failed(
    state: &AppState,
    token: &str,
    view: DayView,
    message: String,
) -> Result<Response, AppError> {
    error!(path = %view.page_path, "time entry change failed: {message}");
    let flash = Flash::error(message);
    let form = CreateEntryForm::for_date(view.date);
    render_day(
        state,
        token,
        &view,
        &form,
        &FieldErrors::new(),
        Some(&flash),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await
}

async fn render_day(
    state: &AppState,
    token: &str,
    view: &DayView,
    form: &CreateEntryForm,
    errors: &FieldErrors,
    flash: Option<&Flash>,
    status: StatusCode,
) -> Result<Response, AppError> {
    let (summary, categories) = tokio::join!(
        state.api.summary_for_date(view.date, token),
        state.api.user_categories(token)
    );
    let summary = summary.map_err(|err| AppError::backend(err, &view.page_path))?;
    let categories = categories.map_err(|err| AppError::backend(err, &view.page_path))?;

    let html = ui::render_day(&DayPage {
        date: view.date,
        summary: &summary,
        categories: &categories,
        form,
        errors,
        flash,
        create_action: &view.create_action,
    });
    Ok((status, Html(html)).into_response())
}

fn notice_flash(notice: Option<&str>) -> Option<Flash> {
    match notice? {
        "created" => Some(Flash::ok("Created Time Entry")),
        "updated" => Some(Flash::ok("Updated Time Entry")),
        "deleted" => Some(Flash::ok("Deleted Time Entry")),
        _ => None,
    }
}

fn path_date(raw: &str) -> Result<NaiveDate, AppError> {
    parse_date(raw).ok_or_else(|| AppError::bad_request(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

fn today_date() -> NaiveDate {
    Local::now().date_naive()
}
