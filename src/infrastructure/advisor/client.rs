//! HTTP implementation of the AdvisorClient port.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::error::AdvisorError;
use super::retry::RetryPolicy;
use crate::domain::errors::DomainResult;
use crate::domain::models::AdvisorConfig;
use crate::domain::ports::{
    AdvisorClient, QuestionRequest, QuestionResponse, RecommendationRequest,
    RecommendationResponse,
};

/// Advisor HTTP client with connection pooling and retrying of transient
/// failures (429, 5xx, connect/timeout errors).
pub struct HttpAdvisorClient {
    http: ReqwestClient,
    base_url: String,
    api_key: Option<String>,
    retry_policy: RetryPolicy,
}

impl HttpAdvisorClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry_policy: RetryPolicy::from(&config.retry),
        })
    }

    async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        request: &Req,
    ) -> Result<Resp, AdvisorError> {
        let mut builder = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::from_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| AdvisorError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AdvisorClient for HttpAdvisorClient {
    async fn ask_question(&self, request: QuestionRequest) -> DomainResult<QuestionResponse> {
        let response = self
            .retry_policy
            .execute(|| self.post("/v1/questions", &request))
            .await?;
        Ok(response)
    }

    async fn recommend(
        &self,
        request: RecommendationRequest,
    ) -> DomainResult<RecommendationResponse> {
        let response = self
            .retry_policy
            .execute(|| self.post("/v1/recommendations", &request))
            .await?;
        Ok(response)
    }

    async fn health_check(&self) -> DomainResult<bool> {
        let mut builder = self.http.get(format!("{}/v1/health", self.base_url));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        match builder.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
