//! Host-injected effect functions: analytics logging, lead submission,
//! and outbound HTTP.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde_json::Value;

use crate::{Config, PageflowError, Result, common::Vars};

/// Options for an outbound API call made by the external-API executor.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub method: String,
    pub headers: HashMap<String, String>,
    /// JSON body; the external-API executor sends the full variable map
    /// for non-GET/HEAD methods
    pub body: Option<Value>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
        }
    }
}

/// The interpreter's outbound boundary, injected by the hosting application.
#[async_trait]
pub trait Effects: Send + Sync {
    /// Fire-and-forget analytics telemetry.
    fn log_event(
        &self,
        event_type: &str,
        payload: Vars,
    );

    /// Persist collected answers. `Ok(false)` and `Err` both route the
    /// submit node's error edge.
    async fn submit_lead(
        &self,
        variables: Vars,
    ) -> Result<bool>;

    /// Perform an outbound HTTP call. Non-2xx responses surface as `Err`;
    /// successful JSON bodies are parsed, other bodies returned as text.
    async fn fetch_api(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<Value>;
}

/// Default [`Effects`] implementation backed by reqwest.
pub struct HttpEffects {
    client: reqwest::Client,
    lead_endpoint: Option<String>,
}

impl HttpEffects {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .build()
            .map_err(|e| PageflowError::Http(e.to_string()))?;
        Ok(Self {
            client,
            lead_endpoint: config.lead_endpoint.clone(),
        })
    }
}

#[async_trait]
impl Effects for HttpEffects {
    fn log_event(
        &self,
        event_type: &str,
        payload: Vars,
    ) {
        tracing::debug!(target: "pageflow::analytics", event_type, %payload);
    }

    async fn submit_lead(
        &self,
        variables: Vars,
    ) -> Result<bool> {
        let Some(endpoint) = &self.lead_endpoint else {
            return Err(PageflowError::Http("no lead endpoint configured".to_string()));
        };
        let res = self.client.post(endpoint).json(&variables).send().await?;
        Ok(res.status().is_success())
    }

    async fn fetch_api(
        &self,
        url: &str,
        options: FetchOptions,
    ) -> Result<Value> {
        let method: reqwest::Method = options.method.parse().map_err(|_| PageflowError::Http(format!("invalid method '{}'", options.method)))?;

        let mut request = self.client.request(method, url);
        for (key, value) in &options.headers {
            request = request.header(key, value);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(PageflowError::Http(format!("request to {} failed with status {}", url, status)));
        }

        let text = res.text().await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(text)),
        }
    }
}
