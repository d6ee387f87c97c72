use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cache::token::IamToken;
use crate::cloud::model::Page;
use crate::error::SdError;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;

pub const PAGE_SIZE: u32 = 1000;

static PAGE_SIZE_PARAM: &str = "pageSize";
static PAGE_TOKEN_PARAM: &str = "pageToken";

/// Bearer-authorised JSON client bound to one API base URL
/// (e.g. `https://compute.api.cloud.yandex.net/compute/v1`).
#[derive(Debug, Clone)]
pub struct CloudApi {
    name: &'static str,
    client: Client,
    base_url: String,
    retry: RetrySettings,
}

impl CloudApi {
    pub fn new(name: &'static str, client: Client, base_url: impl Into<String>, retry: RetrySettings) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { name, client, base_url, retry }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the body, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &IamToken,
    ) -> Result<T, SdError> {
        self.retry
            .run_with_retry(|| self.get_json_once(path, query, token))
            .await
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &IamToken,
    ) -> Result<T, SdError> {
        let url = self.endpoint(path);
        let response = self
            .client
            .get(&url)
            .header(http::header::AUTHORIZATION, token.bearer())
            .query(query)
            .send()
            .await?;

        let status = response.status();
        get_metrics()
            .await
            .api_requests
            .with_label_values(&[self.name, status.as_str()])
            .inc();

        let body = response.text().await?;
        if !status.is_success() {
            return Err(SdError::Api { status, body });
        }

        serde_json::from_str(&body)
            .map_err(|e| SdError::MalformedResponse(format!("{}: {}", url, e)))
    }

    /// Follow `nextPageToken` until exhausted, concatenating items in response order.
    pub async fn paginate<P>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: &IamToken,
    ) -> Result<Vec<P::Item>, SdError>
    where
        P: Page + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut params: Vec<(&str, String)> = query.to_vec();
            params.push((PAGE_SIZE_PARAM, PAGE_SIZE.to_string()));
            if let Some(page_token) = &page_token {
                params.push((PAGE_TOKEN_PARAM, page_token.clone()));
            }

            let page: P = self.get_json(path, &params, token).await?;
            let (page_items, next_page_token) = page.into_parts();
            pages += 1;
            debug!(api = self.name, path, page = pages, items = page_items.len(), "fetched page");
            items.extend(page_items);

            match next_page_token.filter(|next| !next.is_empty()) {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    return Err(SdError::MalformedResponse(format!(
                        "{}: nextPageToken '{}' repeats the requested page",
                        self.endpoint(path),
                        next
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(api = self.name, path, pages, items = items.len(), "listing complete");
        Ok(items)
    }
}
