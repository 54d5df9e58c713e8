//! HTTP client for the time-tracking backend.

use crate::models::{
    AdminEntries, Category, CategoryTree, ErrorEnvelope, LoginInput, RegisterInput,
    RegisterTimeEntryInput, Session, SummaryDay, SummaryMonth, TimeEntry, UpdateTimeEntryInput,
    User, WeekdayHours,
};
use chrono::NaiveDate;
use reqwest::{header::CONTENT_TYPE, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{code}: {message}")]
    Backend {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("{body}")]
    Unexpected { status: StatusCode, body: String },

    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Status reported by the backend, or `502` when it could not be reached.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Backend { status, .. } | ApiError::Unexpected { status, .. } => *status,
            ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
            ApiError::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == StatusCode::UNAUTHORIZED
    }
}

/// Filters understood by the admin listing endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryFilters {
    pub query: Option<String>,
    pub category_ids: Vec<i64>,
    pub user_ids: Vec<i64>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

impl EntryFilters {
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(query) = &self.query {
            pairs.push(("query", query.clone()));
        }
        if !self.category_ids.is_empty() {
            pairs.push(("categoryId", join_ids(&self.category_ids)));
        }
        if !self.user_ids.is_empty() {
            pairs.push(("userId", join_ids(&self.user_ids)));
        }
        if let Some(date) = self.from_date {
            pairs.push(("fromDate", date.format("%Y-%m-%d").to_string()));
        }
        if let Some(date) = self.to_date {
            pairs.push(("toDate", date.format("%Y-%m-%d").to_string()));
        }
        pairs
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
struct SessionBody {
    session: Session,
}

#[derive(Deserialize)]
struct CategoriesBody<T> {
    categories: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeEntryBody {
    time_entry: TimeEntry,
}

#[derive(Deserialize)]
struct SummaryBody<T> {
    summary: T,
}

#[derive(Deserialize)]
struct HoursBody {
    hours: Vec<WeekdayHours>,
}

/// Client for the backend API. Cheap to clone; one instance is built at
/// startup and handed to handlers through the router state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: StdDuration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn register(&self, input: &RegisterInput<'_>) -> Result<User, ApiError> {
        let req = self.http.post(self.url("/v1/auth/register")?).json(input);
        Ok(self.send::<UserBody>(req).await?.user)
    }

    pub async fn log_in(&self, input: &LoginInput<'_>) -> Result<Session, ApiError> {
        let req = self.http.post(self.url("/v1/auth/login")?).json(input);
        Ok(self.send::<SessionBody>(req).await?.session)
    }

    /// Leaf categories the user follows, for the entry form.
    pub async fn user_categories(&self, token: &str) -> Result<Vec<Category>, ApiError> {
        let req = self.http.get(self.url("/v1/me/categories")?).bearer_auth(token);
        Ok(self.send::<CategoriesBody<Category>>(req).await?.categories)
    }

    pub async fn category_trees(&self, token: &str) -> Result<Vec<CategoryTree>, ApiError> {
        let req = self
            .http
            .get(self.url("/v1/me/categories/all")?)
            .bearer_auth(token);
        Ok(self.send::<CategoriesBody<CategoryTree>>(req).await?.categories)
    }

    pub async fn weekly_hours(&self, token: &str) -> Result<Vec<WeekdayHours>, ApiError> {
        let req = self.http.get(self.url("/v1/me/hours")?).bearer_auth(token);
        Ok(self.send::<HoursBody>(req).await?.hours)
    }

    pub async fn create_time_entry(
        &self,
        input: &RegisterTimeEntryInput,
        token: &str,
    ) -> Result<TimeEntry, ApiError> {
        let req = self
            .http
            .post(self.url("/v1/me/time_entries")?)
            .bearer_auth(token)
            .json(input);
        Ok(self.send::<TimeEntryBody>(req).await?.time_entry)
    }

    pub async fn update_time_entry(
        &self,
        id: i64,
        input: &UpdateTimeEntryInput,
        token: &str,
    ) -> Result<TimeEntry, ApiError> {
        let req = self
            .http
            .put(self.url(&format!("/v1/me/time_entries/{id}"))?)
            .bearer_auth(token)
            .json(input);
        Ok(self.send::<TimeEntryBody>(req).await?.time_entry)
    }

    pub async fn delete_time_entry(&self, id: i64, token: &str) -> Result<(), ApiError> {
        let req = self
            .http
            .delete(self.url(&format!("/v1/me/time_entries/{id}"))?)
            .bearer_auth(token);
        self.execute(req).await?;
        Ok(())
    }

    pub async fn summary_for_date(
        &self,
        date: NaiveDate,
        token: &str,
    ) -> Result<SummaryDay, ApiError> {
        let path = format!("/v1/me/time_entries/day/{}", date.format("%Y-%m-%d"));
        let req = self.http.get(self.url(&path)?).bearer_auth(token);
        Ok(self.send::<SummaryBody<SummaryDay>>(req).await?.summary)
    }

    /// `month` is the first day of the month to summarise.
    pub async fn summary_for_month(
        &self,
        month: NaiveDate,
        token: &str,
    ) -> Result<SummaryMonth, ApiError> {
        let path = format!("/v1/me/time_entries/month/{}", month.format("%Y-%m"));
        let req = self.http.get(self.url(&path)?).bearer_auth(token);
        Ok(self.send::<SummaryBody<SummaryMonth>>(req).await?.summary)
    }

    pub async fn admin_entries(
        &self,
        filters: &EntryFilters,
        token: &str,
    ) -> Result<AdminEntries, ApiError> {
        let req = self
            .http
            .get(self.url("/v1/admin/time_entries")?)
            .query(&filters.to_query_pairs())
            .bearer_auth(token);
        self.send::<AdminEntries>(req).await
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let res = self.execute(req).await?;
        Ok(res.json::<T>().await?)
    }

    async fn execute(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let res = req.send().await?;
        let status = res.status();
        debug!(url = %res.url(), %status, "backend response");
        if status.is_success() {
            return Ok(res);
        }

        let is_json = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        let body = res.text().await?;
        if is_json {
            if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
                return Err(ApiError::Backend {
                    status,
                    code: envelope.code,
                    message: envelope.error,
                });
            }
        }

        error!(%status, body, "unexpected backend response");
        Err(ApiError::Unexpected { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        routing::{delete, get, put},
        Json, Router,
    };
    use serde_json::json;

    async fn client_for(router: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        ApiClient::new(
            Url::parse(&format!("http://{addr}")).unwrap(),
            StdDuration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn filters_skip_empty_values() {
        let filters = EntryFilters {
            query: Some("meeting".into()),
            category_ids: vec![1, 4],
            user_ids: vec![],
            from_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            to_date: None,
        };
        assert_eq!(
            filters.to_query_pairs(),
            vec![
                ("query", "meeting".to_string()),
                ("categoryId", "1,4".to_string()),
                ("fromDate", "2026-01-01".to_string()),
            ]
        );
        assert!(EntryFilters::default().to_query_pairs().is_empty());
    }

    #[test]
    fn error_status_maps_from_backend() {
        let err = ApiError::Backend {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED".into(),
            message: "invalid token".into(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "UNAUTHORIZED: invalid token");

        let err = ApiError::Unexpected {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".into(),
        };
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn joins_paths_onto_base_url() {
        let client = ApiClient::new(
            Url::parse("http://localhost:9090").unwrap(),
            StdDuration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.url("/v1/me/time_entries/7").unwrap().as_str(),
            "http://localhost:9090/v1/me/time_entries/7"
        );
    }

    #[tokio::test]
    async fn json_error_envelopes_become_backend_errors() {
        let client = client_for(Router::new().route(
            "/v1/me/categories",
            get(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "category retired", "code": "CONFLICT" })),
                )
            }),
        ))
        .await;

        let err = client.user_categories("t").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "CONFLICT: category retired");
    }

    #[tokio::test]
    async fn plain_text_errors_keep_the_body() {
        let client = client_for(Router::new().route(
            "/v1/me/time_entries/:id",
            delete(|| async { (StatusCode::SERVICE_UNAVAILABLE, "database unavailable") }),
        ))
        .await;

        let err = client.delete_time_entry(3, "t").await.unwrap_err();
        assert!(matches!(&err, ApiError::Unexpected { body, .. } if body == "database unavailable"));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[tokio::test]
    async fn json_errors_without_an_envelope_keep_the_body() {
        let client = client_for(Router::new().route(
            "/v1/me/time_entries/:id",
            put(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "boom" })),
                )
            }),
        ))
        .await;

        let input = UpdateTimeEntryInput {
            duration: crate::duration::HOUR,
            description: String::new(),
        };
        let err = client.update_time_entry(3, &input, "t").await.unwrap_err();
        assert!(matches!(&err, ApiError::Unexpected { .. }));
        assert_eq!(err.to_string(), r#"{"message":"boom"}"#);
    }

    #[tokio::test]
    async fn success_bodies_are_unwrapped() {
        let client = client_for(Router::new().route(
            "/v1/me/hours",
            get(|| async { Json(json!({ "hours": [{ "weekday": 1, "hours": "7h30m0s" }] })) }),
        ))
        .await;

        let hours = client.weekly_hours("t").await.unwrap();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].hours.map(|h| h.to_display_string()).as_deref(), Some("7t 30m"));
    }
}
