use crate::{error::TargetError, target::LoadTarget};
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// Submits commands to the target's HTTP query endpoint.
#[derive(Clone)]
pub struct HttpTarget {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpTarget {
    pub fn new(endpoint: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl LoadTarget for HttpTarget {
    async fn execute(&self, command: &str) -> Result<(), TargetError> {
        debug!(endpoint = %self.endpoint, bytes = command.len(), "Submitting command");

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&QueryRequest { query: command });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(TargetError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}
