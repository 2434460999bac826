//! HTTP client for the page-automation driver sidecar.
//!
//! The driver owns the browser session and exposes the few page interactions
//! the engine needs as plain HTTP endpoints:
//!
//! | Method | Path       | Body                  | Response            |
//! |--------|------------|-----------------------|---------------------|
//! | POST   | `/prepare` |                       | 2xx                 |
//! | GET    | `/sample`  |                       | latest multiplier   |
//! | GET    | `/balance` |                       | balance text        |
//! | POST   | `/bet`     | `{"stake": "1000.00"}`| 2xx                 |
//!
//! A 404 means the driver could not find the element it was asked about.

use std::time::Duration;

use mwatch_engine::{BoxFuture, Collaborator, CollaboratorError, CollaboratorResult};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct BetRequest<'a> {
    stake: &'a str,
}

/// `Collaborator` backed by the driver sidecar.
pub struct HttpCollaborator {
    client: Client,
    base_url: String,
}

impl HttpCollaborator {
    pub fn new(config: &DriverConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AppError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_text(&self, path: &str) -> CollaboratorResult<String> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(path, response).await?;
        response.text().await.map_err(transport_error)
    }
}

impl Collaborator for HttpCollaborator {
    fn prepare(&self) -> BoxFuture<'_, CollaboratorResult<()>> {
        Box::pin(async move {
            info!(url = %self.base_url, "Preparing page through driver");
            let response = self
                .client
                .post(self.url("/prepare"))
                .send()
                .await
                .map_err(transport_error)?;
            check_status("/prepare", response).await?;
            Ok(())
        })
    }

    fn read_sample_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
        Box::pin(self.get_text("/sample"))
    }

    fn read_balance_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
        Box::pin(self.get_text("/balance"))
    }

    fn place_bet<'a>(&'a self, stake: &'a str) -> BoxFuture<'a, CollaboratorResult<()>> {
        Box::pin(async move {
            debug!(stake, "Submitting bet to driver");
            let response = self
                .client
                .post(self.url("/bet"))
                .json(&BetRequest { stake })
                .send()
                .await
                .map_err(transport_error)?;
            check_status("/bet", response).await?;
            Ok(())
        })
    }
}

fn transport_error(e: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Unreachable(e.to_string())
}

async fn check_status(path: &str, response: Response) -> CollaboratorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = if body.trim().is_empty() {
        path.to_string()
    } else {
        body.trim().to_string()
    };

    Err(if status == StatusCode::NOT_FOUND {
        CollaboratorError::ElementNotFound(detail)
    } else {
        CollaboratorError::Driver(format!("HTTP {status} on {path}: {detail}"))
    })
}
