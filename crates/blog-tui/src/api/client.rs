use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use blog_shared::{
    api::{CreateCommentRequest, UpdateCommentRequest},
    Comment, CommentId, Post, PostId, User,
};
use reqwest::{header::COOKIE, Client, Method, RequestBuilder, StatusCode};

use super::auth::{AuthToken, TokenStore};

/// JWT payload claims we need for expiry checking
#[derive(serde::Deserialize)]
struct JwtClaims {
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<AuthToken>,
    store: Option<TokenStore>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            store: None,
        }
    }

    /// Persist the token through `store` across runs.
    pub fn with_store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Pick up a token saved by an earlier run
    pub fn load_token(&mut self) -> Result<bool> {
        if let Some(store) = &self.store {
            self.token = store.load()?;
        }
        Ok(self.token.is_some())
    }

    /// Use a token handed in through the environment and remember it
    pub fn set_token(&mut self, token: &str) -> Result<()> {
        let token = AuthToken::new(token);
        if let Some(store) = &self.store {
            store.save(&token)?;
        }
        self.token = Some(token);
        Ok(())
    }

    /// Check if a token is present and not expired
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && !self.is_token_expired()
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_cookie(&self) -> Option<String> {
        self.token
            .as_ref()
            .map(|t| format!("auth_token={}", t.auth_token))
    }

    /// Decode JWT payload and extract expiration time
    fn decode_token_exp(token: &str) -> Option<i64> {
        // JWT format: header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
        let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;

        Some(claims.exp)
    }

    fn is_token_expired(&self) -> bool {
        let Some(token) = &self.token else {
            return true;
        };

        let Some(exp) = Self::decode_token_exp(&token.auth_token) else {
            return false; // Can't decode = let the server decide
        };

        exp <= chrono::Utc::now().timestamp()
    }

    // ============ Request Helpers ============

    /// Request that carries the token when there is one. Reads are public.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.auth_cookie() {
            Some(cookie) if !self.is_token_expired() => builder.header(COOKIE, cookie),
            _ => builder,
        }
    }

    /// Request that requires a valid token
    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthorized);
        }
        Ok(self.request(method, path))
    }

    /// Handle API response
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                response.json().await.map_err(ApiError::Network)
            }
            _ => Err(Self::error_for(status, response).await),
        }
    }

    /// Handle response whose body we don't need
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(Self::error_for(status, response).await),
        }
    }

    async fn error_for(status: StatusCode, response: reqwest::Response) -> ApiError {
        let error = match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let text = response.text().await.unwrap_or_default();
                ApiError::Validation(text)
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                ApiError::Server(format!("{}: {}", status, text))
            }
        };
        tracing::warn!(%status, error = %error, "request failed");
        error
    }

    // ============ Auth ============

    pub async fn me(&self) -> Result<User, ApiError> {
        let response = self.authed(Method::GET, "/user/me")?.send().await?;
        self.handle_response(response).await
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        if self.is_authenticated() {
            let _ = self.request(Method::POST, "/auth/logout").send().await;
        }

        self.token = None;
        if let Some(store) = &self.store {
            store.clear().map_err(ApiError::Other)?;
        }
        Ok(())
    }

    // ============ Posts ============

    pub async fn get_post(&self, post_id: &PostId) -> Result<Post, ApiError> {
        let path = format!("/post/{}", urlencoding::encode(post_id.as_str()));
        let response = self.request(Method::GET, &path).send().await?;
        self.handle_response(response).await
    }

    // ============ Comments ============

    /// Comments come embedded in the post resource.
    pub async fn list_comments(&self, post_id: &PostId) -> Result<Vec<Comment>, ApiError> {
        Ok(self.get_post(post_id).await?.comments)
    }

    pub async fn create_comment(&self, req: &CreateCommentRequest) -> Result<Comment, ApiError> {
        let response = self
            .authed(Method::POST, "/comment")?
            .json(req)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn update_comment(
        &self,
        comment_id: &CommentId,
        req: &UpdateCommentRequest,
    ) -> Result<(), ApiError> {
        let path = format!("/comment/{}", urlencoding::encode(comment_id.as_str()));
        let response = self.authed(Method::PUT, &path)?.json(req).send().await?;
        self.handle_empty_response(response).await
    }

    pub async fn delete_comment(&self, comment_id: &CommentId) -> Result<(), ApiError> {
        let path = format!("/comment/{}", urlencoding::encode(comment_id.as_str()));
        let response = self.authed(Method::DELETE, &path)?.send().await?;
        self.handle_empty_response(response).await
    }
}
