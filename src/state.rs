use crate::api::ApiClient;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
}

impl AppState {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}
