use anyhow::{Context, Result};
use plads_common::models::auth::AuthResponse;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::sync::Arc;

/// HTTP client for the Plads API
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Arc<str>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create an account. Returns the issued session credentials; feed
    /// them to [`crate::SessionManager::login`].
    #[tracing::instrument(skip(self, password, image))]
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        image: Vec<u8>,
        image_mime: &str,
    ) -> Result<AuthResponse> {
        let url = format!("{}/api/users/signup", self.base_url);
        let part = Part::bytes(image)
            .file_name("avatar")
            .mime_str(image_mime)
            .context("Invalid image MIME type")?;
        let form = Form::new()
            .text("name", name.to_string())
            .text("email", email.to_string())
            .text("password", password.to_string())
            .part("image", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Failed to send signup request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read body".to_string());
            anyhow::bail!("Signup failed with status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse signup response")
    }

    /// Authenticate with email and password
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let url = format!("{}/api/users/login", self.base_url);
        let req = LoginRequest { email, password };

        let response = self
            .client
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to send login request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read body".to_string());
            anyhow::bail!("Login failed with status {}: {}", status, body);
        }

        response
            .json()
            .await
            .context("Failed to parse login response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/");
        assert_eq!(client.base_url(), "http://localhost:8080");
        let client = ApiClient::new("http://localhost:8080");
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_auth_response_wire_shape() {
        let user_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"userId": "{}", "email": "ann@x.com", "token": "jwt"}}"#,
            user_id
        );
        let parsed: AuthResponse = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.user_id, user_id);
        assert_eq!(parsed.email, "ann@x.com");
        assert_eq!(parsed.token, "jwt");
    }
}
