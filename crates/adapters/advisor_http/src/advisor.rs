//! `reqwest` implementation of the [`Advisor`] port.

use std::future::Future;

use gardenhub_app::ports::Advisor;
use gardenhub_domain::advisory::{AdvisorResponse, AdvisoryRequest};
use gardenhub_domain::error::GardenHubError;

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::wire::{ChatRequest, ChatResponse};

/// Decision service client.
pub struct HttpAdvisor {
    client: reqwest::Client,
    chat_url: String,
}

impl HttpAdvisor {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Http`] if the HTTP client cannot be built
    /// (e.g. no TLS backend available).
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            chat_url: config.chat_url(),
        })
    }

    async fn chat(&self, request: &AdvisoryRequest) -> Result<AdvisorResponse, AdvisorError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&ChatRequest::from(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let answer: ChatResponse = response.json().await?;
        answer.try_into()
    }
}

impl Advisor for HttpAdvisor {
    fn advise(
        &self,
        request: AdvisoryRequest,
    ) -> impl Future<Output = Result<AdvisorResponse, GardenHubError>> + Send {
        async move {
            tracing::debug!(device_id = %request.device_id, mode = %request.mode, url = %self.chat_url, "consulting advisor");
            Ok(self.chat(&request).await?)
        }
    }
}
