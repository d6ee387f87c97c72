use std::future::Future;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::token::IamToken;
use crate::cloud::iam::IamTokenIssuer;
use crate::error::SdError;
use crate::helpers::time::now;
use crate::observability::metrics::get_metrics;

static SUCCESS_MSG: &str = "success";
static ERROR_MSG: &str = "error";

/// Something able to mint a fresh IAM token.
pub trait IssueToken: Send + Sync {
    fn issue_token(&self) -> impl Future<Output = Result<IamToken, SdError>> + Send;
}

/// Holds one cached IAM token and refreshes it on demand.
///
/// The lock is held across the refresh, so concurrent callers that find the
/// token missing or expired wait for a single in-flight request instead of
/// each issuing their own.
#[derive(Debug)]
pub struct TokenProvider<I = IamTokenIssuer> {
    issuer: I,
    safety_margin_seconds: u64,
    cached: Mutex<Option<IamToken>>,
}

impl<I: IssueToken> TokenProvider<I> {
    pub fn new(issuer: I) -> Self {
        Self { issuer, safety_margin_seconds: 0, cached: Mutex::new(None) }
    }

    /// Refresh tokens this many seconds before they actually expire.
    pub fn with_safety_margin(mut self, safety_margin_seconds: u64) -> Self {
        self.safety_margin_seconds = safety_margin_seconds;
        self
    }

    /// Return the cached token if still valid, otherwise issue and cache a new one.
    pub async fn get_valid_token(&self) -> Result<IamToken, SdError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached
            .as_ref()
            .filter(|token| token.is_valid_with_margin(now(), self.safety_margin_seconds))
        {
            debug!(expires_at = %token.expires_at, "using cached iam token");
            return Ok(token.clone());
        }

        let metrics = get_metrics().await;
        match self.issuer.issue_token().await {
            Ok(token) => {
                info!(expires_at = %token.expires_at, "issued new iam token");
                metrics.iam_token_fetches.with_label_values(&[SUCCESS_MSG]).inc();
                metrics.iam_token_expiry_unix.set(token.expires_at.timestamp());
                *cached = Some(token.clone());
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "iam token refresh failed");
                metrics.iam_token_fetches.with_label_values(&[ERROR_MSG]).inc();
                Err(err)
            }
        }
    }

    /// Currently cached token, valid or not.
    pub async fn cached(&self) -> Option<IamToken> {
        self.cached.lock().await.clone()
    }
}
