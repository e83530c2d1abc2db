use std::time::Duration;

use crate::types::{ApiError, JobId, JobSummary};
use crate::validate::validate_args;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the job service API, without a trailing slash.
    pub base_url: String,
    /// Opaque bearer credential attached to create and poll requests.
    pub bearer_token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            bearer_token: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// HTTP wrapper over the job service endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// URL of the push subscription stream.
    pub fn subscribe_url(&self) -> String {
        self.endpoint("subscribe")
    }

    /// URL of a job's result artifact. Only meaningful once the job is
    /// Completed.
    pub fn download_url(&self, job_id: &str) -> String {
        format!("{}?uuid={job_id}", self.endpoint("job/download"))
    }

    /// Submits scan arguments and returns the created job's id.
    ///
    /// Arguments are validated first; a validation failure returns without
    /// touching the network. A 403 maps to [`ApiError::Forbidden`] so callers
    /// can present it distinctly.
    pub async fn create_job(&self, args: &str) -> Result<JobId, ApiError> {
        validate_args(args)?;

        let response = self
            .http
            .post(self.endpoint("job/create"))
            .bearer_auth(&self.config.bearer_token)
            .json(&serde_json::json!({ "args": args }))
            .send()
            .await
            .map_err(map_transport)?;

        let response = check_status(response).await?;
        response
            .json::<JobId>()
            .await
            .map_err(|err| ApiError::MalformedResponse(err.to_string()))
    }

    /// Fetches the current status label for a job.
    pub async fn job_status(&self, job_id: &str) -> Result<String, ApiError> {
        let response = self
            .http
            .get(self.endpoint("job/status"))
            .query(&[("uuid", job_id)])
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await
            .map_err(map_transport)?;

        let response = check_status(response).await?;
        response
            .json::<String>()
            .await
            .map_err(|err| ApiError::MalformedResponse(err.to_string()))
    }

    /// Fetches the server-side job list, used to seed the registry at startup.
    pub async fn list_jobs(&self) -> Result<Vec<JobSummary>, ApiError> {
        let response = self
            .http
            .get(self.endpoint("job/list"))
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await
            .map_err(map_transport)?;

        let response = check_status(response).await?;
        response
            .json::<Vec<JobSummary>>()
            .await
            .map_err(|err| ApiError::MalformedResponse(err.to_string()))
    }

    /// Asks the service to delete all jobs.
    pub async fn delete_all_jobs(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .delete(self.endpoint("jobs"))
            .bearer_auth(&self.config.bearer_token)
            .send()
            .await
            .map_err(map_transport)?;

        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ApiError::Forbidden);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

fn map_transport(err: reqwest::Error) -> ApiError {
    ApiError::Transport(err.to_string())
}

/// Seam for the poll loop: anything that can answer "what is this job's
/// status right now".
#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    async fn job_status(&self, job_id: &str) -> Result<String, ApiError>;
}

#[async_trait::async_trait]
impl StatusSource for ApiClient {
    async fn job_status(&self, job_id: &str) -> Result<String, ApiError> {
        ApiClient::job_status(self, job_id).await
    }
}
