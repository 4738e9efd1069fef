//! HTTP client for network-based API calls

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::ErrorBody;
use shared::client::{
    AddSkillRequest, CreateEmployeeResponse, CurrentUserResponse, EditFieldResponse,
    EmployeeActionResponse, HealthResponse, LoginRequest, LoginResponse,
};
use shared::models::{DashboardSnapshot, EmployeeCreate, EmployeeId, EmployeeRecord, FieldEdit};

use crate::{ClientConfig, ClientError, ClientResult};

/// HTTP client for making network requests to the attendance server
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.authorized(self.client.get(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.authorized(self.client.post(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    /// Make a POST request without body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.authorized(self.client.post(self.url(path)));
        Self::handle_response(request.send().await?).await
    }

    /// Make a PATCH request with JSON body
    pub async fn patch<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.authorized(self.client.patch(self.url(path)).json(body));
        Self::handle_response(request.send().await?).await
    }

    /// Handle the HTTP response
    ///
    /// 失败响应体为 `ErrorBody`，按状态码映射为 [`ClientError`]
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let body = serde_json::from_str::<ErrorBody>(&text).ok();
            let message = body
                .as_ref()
                .map(|b| b.message.clone())
                .unwrap_or_else(|| text.clone());
            let code = body.as_ref().and_then(|b| b.error_code());

            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::FORBIDDEN => ClientError::Forbidden(message),
                StatusCode::NOT_FOUND => ClientError::NotFound(message),
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                    ClientError::Validation(message)
                }
                _ => ClientError::RequestFailed { code, message },
            });
        }

        response.json().await.map_err(Into::into)
    }

    // ========== Auth API ==========

    /// Login with email and password
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("/api/auth/login", &request).await
    }

    /// Get current user information
    pub async fn me(&self) -> ClientResult<CurrentUserResponse> {
        self.get("/api/auth/me").await
    }

    pub async fn health(&self) -> ClientResult<HealthResponse> {
        self.get("/health").await
    }

    // ========== Dashboard / Employee API ==========

    pub async fn dashboard(&self) -> ClientResult<DashboardSnapshot> {
        self.get("/api/admin/dashboard").await
    }

    pub async fn create_employee(
        &self,
        payload: &EmployeeCreate,
    ) -> ClientResult<CreateEmployeeResponse> {
        self.post("/api/employees", payload).await
    }

    pub async fn edit_field(
        &self,
        id: EmployeeId,
        edit: &FieldEdit,
    ) -> ClientResult<EditFieldResponse> {
        self.patch(&format!("/api/employees/{id}"), edit).await
    }

    pub async fn add_skill(&self, id: EmployeeId, skill: &str) -> ClientResult<EmployeeActionResponse> {
        let body = AddSkillRequest {
            skill: skill.to_string(),
        };
        self.post(&format!("/api/employees/{id}/skills"), &body).await
    }

    /// The logged-in employee's own record
    pub async fn profile(&self) -> ClientResult<EmployeeRecord> {
        self.get("/api/employees/profile").await
    }

    pub async fn clock_in(&self) -> ClientResult<EmployeeActionResponse> {
        self.post_empty("/api/employees/clock-in").await
    }

    pub async fn clock_out(&self) -> ClientResult<EmployeeActionResponse> {
        self.post_empty("/api/employees/clock-out").await
    }
}
