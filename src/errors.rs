use crate::api::ApiError;
use crate::session;
use crate::ui::render_error;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{error, warn};

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Set when the visitor has to log in again; the response redirects there.
    pub login_redirect: Option<String>,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Sends the visitor to the login page, coming back to `path` afterwards.
    pub fn unauthenticated(path: &str) -> Self {
        Self {
            status: StatusCode::SEE_OTHER,
            message: "login required".to_string(),
            login_redirect: Some(session::login_path(path)),
        }
    }

    /// Maps a failed backend call made while serving `path`.
    pub fn backend(err: ApiError, path: &str) -> Self {
        if err.is_unauthorized() {
            warn!(path, "backend rejected session: {err}");
            return Self::unauthenticated(path);
        }
        error!(path, "backend call failed: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            login_redirect: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.login_redirect {
            Some(location) => {
                let mut response = Redirect::to(&location).into_response();
                response.headers_mut().insert(
                    header::SET_COOKIE,
                    HeaderValue::from_static(session::CLEAR_COOKIE),
                );
                response
            }
            None => (self.status, Html(render_error(self.status, &self.message))).into_response(),
        }
    }
}
