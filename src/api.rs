use crate::errors::ClientError;
use crate::models::{
    ActivityRecord, ApiErrorBody, CategoriesPayload, Category, DailyStatsPayload,
    FinishActivityRequest, FinishActivityResponse, SettingsUpdate, StartActivityRequest,
    UserProfile,
};
use crate::stats::DailyStats;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// Header carrying the host-supplied user id on every request.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Operations the session needs from the remote stats service.
#[async_trait]
pub trait StatsService: Send + Sync {
    async fn fetch_user(&self) -> Result<UserProfile, ClientError>;

    async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError>;

    async fn fetch_daily_stats(&self) -> Result<DailyStats, ClientError>;

    async fn start_activity(
        &self,
        request: &StartActivityRequest,
    ) -> Result<ActivityRecord, ClientError>;

    async fn finish_activity(
        &self,
        request: &FinishActivityRequest,
    ) -> Result<FinishActivityResponse, ClientError>;

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), ClientError>;
}

/// `StatsService` over HTTP with JSON bodies.
pub struct HttpStatsService {
    client: Client,
    base_url: String,
    user_id: String,
}

impl HttpStatsService {
    pub fn new(base_url: &str, timeout: Duration, user_id: i64) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id: user_id.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        debug!(path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .header(USER_ID_HEADER, &self.user_id)
            .send()
            .await?;
        decode(response).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, ClientError> {
        debug!(path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .header(USER_ID_HEADER, &self.user_id)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl StatsService for HttpStatsService {
    async fn fetch_user(&self) -> Result<UserProfile, ClientError> {
        self.get("/api/user").await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, ClientError> {
        let payload: CategoriesPayload = self.get("/api/stats/categories").await?;
        Ok(payload.into_categories())
    }

    async fn fetch_daily_stats(&self) -> Result<DailyStats, ClientError> {
        let payload: DailyStatsPayload = self.get("/api/stats/daily").await?;
        Ok(DailyStats::from(payload))
    }

    async fn start_activity(
        &self,
        request: &StartActivityRequest,
    ) -> Result<ActivityRecord, ClientError> {
        let response = self.post("/api/activity/start", request).await?;
        decode(response).await
    }

    async fn finish_activity(
        &self,
        request: &FinishActivityRequest,
    ) -> Result<FinishActivityResponse, ClientError> {
        let response = self.post("/api/activity/finish", request).await?;
        decode(response).await
    }

    async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), ClientError> {
        let response = self.post("/api/settings", update).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let bytes = response.bytes().await?;
        Err(server_error(status.as_u16(), &bytes))
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        return Err(server_error(status.as_u16(), &bytes));
    }
    serde_json::from_slice(&bytes).map_err(|err| ClientError::Malformed(err.to_string()))
}

fn server_error(status: u16, body: &[u8]) -> ClientError {
    // Only a JSON `error` field is user-facing; anything else stays in the log.
    let message = match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(body) => body.error,
        Err(_) => {
            debug!(status, body = %String::from_utf8_lossy(body), "non-JSON error body");
            String::new()
        }
    };
    ClientError::Server { status, message }
}
