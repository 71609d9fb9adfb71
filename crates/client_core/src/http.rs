use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::{
    config::Settings,
    error::{ClientError, ClientResult},
    reviews::MetricScale,
};

/// Thin reqwest wrapper shared by every backend-facing trait implementation.
#[derive(Clone)]
pub struct HttpBackend {
    http: Client,
    base_url: String,
    metric_scale: Option<MetricScale>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            metric_scale: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url: settings.normalized_base_url()?,
            metric_scale: settings.metric_scale,
        })
    }

    pub fn with_metric_scale(mut self, scale: Option<MetricScale>) -> Self {
        self.metric_scale = scale;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn metric_scale(&self) -> Option<MetricScale> {
        self.metric_scale
    }

    fn request(&self, method: reqwest::Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
    ) -> ClientResult<T> {
        let body = send(self.request(reqwest::Method::GET, path, token), path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn get_json_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &Q,
    ) -> ClientResult<T> {
        let body = send(
            self.request(reqwest::Method::GET, path, token).query(query),
            path,
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        payload: &B,
    ) -> ClientResult<T> {
        let body = send(
            self.request(reqwest::Method::POST, path, token).json(payload),
            path,
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// For endpoints whose response body the client has no use for.
    pub(crate) async fn post_json_ignoring_body<B: Serialize + ?Sized>(
        &self,
        path: &str,
        token: Option<&str>,
        payload: &B,
    ) -> ClientResult<()> {
        send(
            self.request(reqwest::Method::POST, path, token).json(payload),
            path,
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        payload: &B,
    ) -> ClientResult<T> {
        let body = send(
            self.request(reqwest::Method::PUT, path, token).json(payload),
            path,
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn send(request: RequestBuilder, path: &str) -> ClientResult<String> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        debug!(path, status = status.as_u16(), "http: request rejected");
        return Err(ClientError::from_response(status, &body));
    }
    Ok(body)
}
