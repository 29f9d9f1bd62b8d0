//! API client for the quality inference service

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use server_lib::{FeatureVector, MetricsRecord, PredictionResult, StreamItem};
use std::collections::BTreeMap;
use url::Url;

/// API client for the inference service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        // Keep any path prefix when joining endpoint paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(error) => error.describe(),
                Err(_) => body,
            };
            anyhow::bail!("API error ({}): {}", status, message);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn models(&self) -> Result<ModelList> {
        self.get("models").await
    }

    pub async fn predict(&self, features: &FeatureVector, model: &str) -> Result<PredictionResult> {
        let request = PredictRequest { features, model };
        self.post("predict", &request).await
    }

    pub async fn sample_stream(&self, n: i64) -> Result<StreamResponse> {
        self.get(&format!("sample-stream?n={}", n)).await
    }

    pub async fn metrics(&self) -> Result<BTreeMap<String, MetricsRecord>> {
        self.get("metrics").await
    }
}

// API request and response types

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub features: &'a FeatureVector,
    pub model: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<String>,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamResponse {
    pub items: Vec<StreamItem>,
}

/// Error body returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub details: Vec<FieldDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDetail {
    pub field: String,
    pub kind: String,
}

impl ErrorBody {
    fn describe(&self) -> String {
        let mut message = self.error.clone();
        if let Some(reason) = &self.reason {
            message = format!("{} [{}]", message, reason);
        }
        for detail in &self.details {
            message.push_str(&format!("\n  - {}: {}", detail.field, detail.kind.replace('_', "-")));
        }
        message
    }
}
