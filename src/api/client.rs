use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::{
    PadelBackend,
    auth::TokenStore,
    config::ApiConfig,
    error::{ApiError, ApiResult},
    models::{
        AdminStatsDto, AssignTeamsRequest, BackendErrorBody, CategoryDto, CategoryId,
        CreateRoomRequest, DisputeRequest, JoinRoomRequest, LogEntryDto, MatchResultDto,
        RankingEntryDto, RoomDto, RoomId, SubmitResultRequest,
    },
};

/// reqwest-backed implementation of [`PadelBackend`].
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Arc<str>,
    request_timeout: Duration,
    tokens: Arc<TokenStore>,
}

impl HttpBackend {
    /// Build the HTTP client. Tokens are read from `tokens` on every request.
    pub fn new(config: ApiConfig, tokens: Arc<TokenStore>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| ApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
            request_timeout: config.request_timeout,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send_error(&self, path: &str, source: reqwest::Error) -> ApiError {
        if source.is_timeout() {
            ApiError::Timeout {
                path: path.to_string(),
                after: self.request_timeout,
            }
        } else {
            ApiError::RequestSend {
                path: path.to_string(),
                source,
            }
        }
    }

    /// Send an authenticated request. A 401 is retried once with the alternate token; when
    /// every token is rejected the credentials are cleared and the session is over.
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<Response>
    where
        B: ?Sized + Serialize,
    {
        let tokens = self.tokens.candidates().await;
        if tokens.is_empty() {
            return Err(ApiError::NotSignedIn);
        }

        for (attempt, token) in tokens.iter().enumerate() {
            let mut builder = self
                .client
                .request(method.clone(), self.url(path))
                .bearer_auth(token);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|source| self.send_error(path, source))?;

            if response.status() != StatusCode::UNAUTHORIZED {
                return check_status(path, response).await;
            }
            debug!(path, attempt, "backend rejected bearer token");
        }

        warn!(path, "every stored token was rejected; clearing session");
        self.tokens.clear().await;
        Err(ApiError::SessionExpired)
    }

    async fn get_json<T>(&self, path: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send::<()>(Method::GET, path, None).await?;
        decode(path, response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> ApiResult<T>
    where
        B: ?Sized + Serialize,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, Some(body)).await?;
        decode(path, response).await
    }

    async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<()>
    where
        B: ?Sized + Serialize,
    {
        self.send(method, path, body).await.map(|_| ())
    }
}

async fn decode<T>(path: &str, response: Response) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    response
        .json::<T>()
        .await
        .map_err(|source| ApiError::DecodeResponse {
            path: path.to_string(),
            source,
        })
}

/// Turn non-success responses into [`ApiError::Status`], keeping the backend message.
async fn check_status(path: &str, response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .ok()
        .and_then(|text| serde_json::from_str::<BackendErrorBody>(&text).ok())
        .unwrap_or_default();
    let error_type = body.error_type.clone();
    let message = body
        .into_message()
        .unwrap_or_else(|| format!("backend responded with {status}"));

    Err(ApiError::Status {
        path: path.to_string(),
        status,
        message,
        error_type,
    })
}

impl PadelBackend for HttpBackend {
    fn create_room(&self, request: CreateRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let backend = self.clone();
        Box::pin(async move { backend.send_json(Method::POST, "rooms", &request).await })
    }

    fn join_room(&self, request: JoinRoomRequest) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let backend = self.clone();
        Box::pin(async move { backend.send_json(Method::POST, "rooms/join", &request).await })
    }

    fn list_rooms(&self) -> BoxFuture<'static, ApiResult<Vec<RoomDto>>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json("rooms").await })
    }

    fn fetch_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<RoomDto>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json(&format!("rooms/{id}")).await })
    }

    fn assign_teams(
        &self,
        id: RoomId,
        request: AssignTeamsRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty(Method::PUT, &format!("rooms/{id}/teams"), Some(&request))
                .await
        })
    }

    fn start_match(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty::<()>(Method::POST, &format!("rooms/{id}/start"), None)
                .await
        })
    }

    fn delete_room(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty::<()>(Method::DELETE, &format!("rooms/{id}"), None)
                .await
        })
    }

    fn submit_result(
        &self,
        id: RoomId,
        request: SubmitResultRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty(Method::POST, &format!("rooms/{id}/result"), Some(&request))
                .await
        })
    }

    fn fetch_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<Option<MatchResultDto>>> {
        let backend = self.clone();
        Box::pin(async move {
            match backend.get_json(&format!("rooms/{id}/result")).await {
                Ok(result) => Ok(Some(result)),
                Err(err) if err.is_not_found() => Ok(None),
                Err(err) => Err(err),
            }
        })
    }

    fn confirm_result(&self, id: RoomId) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty::<()>(Method::POST, &format!("rooms/{id}/result/confirm"), None)
                .await
        })
    }

    fn dispute_result(
        &self,
        id: RoomId,
        request: DisputeRequest,
    ) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty(
                    Method::POST,
                    &format!("rooms/{id}/result/report"),
                    Some(&request),
                )
                .await
        })
    }

    fn fetch_ranking(&self) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json("ranking").await })
    }

    fn fetch_category_ranking(
        &self,
        id: CategoryId,
    ) -> BoxFuture<'static, ApiResult<Vec<RankingEntryDto>>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json(&format!("ranking/category/{id}")).await })
    }

    fn fetch_categories(&self) -> BoxFuture<'static, ApiResult<Vec<CategoryDto>>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json("categories").await })
    }

    fn fetch_stats(&self) -> BoxFuture<'static, ApiResult<AdminStatsDto>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json("admin/stats").await })
    }

    fn fetch_logs(&self) -> BoxFuture<'static, ApiResult<Vec<LogEntryDto>>> {
        let backend = self.clone();
        Box::pin(async move { backend.get_json("admin/logs").await })
    }

    fn export_logs(&self) -> BoxFuture<'static, ApiResult<Vec<u8>>> {
        let backend = self.clone();
        Box::pin(async move {
            const EXPORT: &str = "admin/logs/export";
            let response = backend.send::<()>(Method::GET, EXPORT, None).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|source| ApiError::DecodeResponse {
                    path: EXPORT.to_string(),
                    source,
                })?;
            Ok(bytes.to_vec())
        })
    }

    fn purge_logs(&self) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            backend
                .send_empty::<()>(Method::DELETE, "admin/logs", None)
                .await
        })
    }

    fn health_check(&self) -> BoxFuture<'static, ApiResult<()>> {
        let backend = self.clone();
        Box::pin(async move {
            const HEALTH: &str = "health";
            let response = backend
                .client
                .get(backend.url(HEALTH))
                .send()
                .await
                .map_err(|source| backend.send_error(HEALTH, source))?;
            check_status(HEALTH, response).await.map(|_| ())
        })
    }
}
