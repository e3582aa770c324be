//! HTTP client for a Prismic repository

use serde::de::DeserializeOwned;

use super::predicates::{query_string, Predicate, QueryOptions};
use super::types::{ApiDescriptor, Document, QueryResponse};
use super::{ContentError, ContentSource};
use crate::config::PrismicConfig;

/// Talks to the Prismic REST API v2
#[derive(Clone)]
pub struct PrismicClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(endpoint: &str, access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    pub fn from_config(config: &PrismicConfig) -> Result<Self, ContentError> {
        if config.endpoint.trim().is_empty() {
            return Err(ContentError::MissingEndpoint);
        }
        Ok(Self::new(&config.endpoint, config.access_token.clone()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ContentError> {
        let mut request = self.client.get(url).query(params);
        if let Some(ref token) = self.access_token {
            // Cursor URLs already carry the token
            if !url.contains("access_token=") {
                request = request.query(&[("access_token", token)]);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ContentError::Status {
                status,
                url: response.url().to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn resolve_ref(&self, reference: Option<&str>) -> Result<String, ContentError> {
        match reference {
            Some(r) => Ok(r.to_string()),
            None => self.master_ref().await,
        }
    }
}

impl ContentSource for PrismicClient {
    async fn master_ref(&self) -> Result<String, ContentError> {
        let api: ApiDescriptor = self.get_json(&self.endpoint, &[]).await?;
        api.master_ref()
            .map(str::to_string)
            .ok_or(ContentError::NoMasterRef)
    }

    async fn query(
        &self,
        predicates: &[Predicate],
        options: &QueryOptions,
    ) -> Result<QueryResponse, ContentError> {
        let reference = self.resolve_ref(options.reference.as_deref()).await?;

        let mut params = vec![("ref", reference), ("q", query_string(predicates))];
        params.extend(options.to_params());

        let url = format!("{}/documents/search", self.endpoint);
        tracing::debug!("Querying {} with {:?}", url, params);
        self.get_json(&url, &params).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<QueryResponse, ContentError> {
        tracing::debug!("Fetching next page {}", cursor);
        self.get_json(cursor, &[]).await
    }
}
