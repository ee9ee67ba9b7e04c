//! User and account operations.

use std::sync::Arc;

use crate::client::{ApiClient, ApiRequest};
use crate::error::TfcResult;
use crate::jsonapi::ResourceObject;

/// User lookup over the shared request engine.
#[derive(Debug, Clone)]
pub struct Users {
    api: Arc<ApiClient>,
}

impl Users {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Read a single user by id.
    pub async fn get(&self, user_id: &str) -> TfcResult<ResourceObject> {
        self.api
            .request(&ApiRequest::get(format!("/api/v2/users/{user_id}")))
            .await
    }
}

/// Details of the account that owns the API token.
#[derive(Debug, Clone)]
pub struct Account {
    api: Arc<ApiClient>,
}

impl Account {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Read the token holder's account details.
    pub async fn details(&self) -> TfcResult<ResourceObject> {
        self.api
            .request(&ApiRequest::get("/api/v2/account/details"))
            .await
    }
}
