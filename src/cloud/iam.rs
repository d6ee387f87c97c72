use reqwest::Client;
use rsa::RsaPrivateKey;
use tracing::debug;

use crate::cache::token::IamToken;
use crate::cache::token_cache::IssueToken;
use crate::cloud::jwt::{sign_assertion, AssertionClaims};
use crate::config::cloud::IAM_TOKENS_URL;
use crate::cloud::model::{CreateIamTokenRequest, CreateIamTokenResponse};
use crate::error::SdError;
use crate::helpers::time::now_i64;

/// Exchanges service-account signed assertions for IAM tokens.
#[derive(Clone)]
pub struct IamTokenIssuer {
    client: Client,
    endpoint: String,
    service_account_id: String,
    key_id: String,
    private_key: RsaPrivateKey,
}

impl IamTokenIssuer {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        service_account_id: impl Into<String>,
        key_id: impl Into<String>,
        private_key: RsaPrivateKey,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            service_account_id: service_account_id.into(),
            key_id: key_id.into(),
            private_key,
        }
    }

    async fn exchange(&self) -> Result<IamToken, SdError> {
        let claims = AssertionClaims::new(&self.service_account_id, IAM_TOKENS_URL, now_i64());
        let jwt = sign_assertion(&self.private_key, &self.key_id, &claims)?;

        debug!(service_account_id = %self.service_account_id, key_id = %self.key_id, "requesting iam token");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&CreateIamTokenRequest { jwt: &jwt })
            .send()
            .await
            .map_err(|e| SdError::Auth(format!("identity endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SdError::Auth(format!("reading identity response: {}", e)))?;
        if !status.is_success() {
            return Err(SdError::Auth(format!("{}: {}", status, body)));
        }

        serde_json::from_str::<CreateIamTokenResponse>(&body)
            .map(IamToken::from)
            .map_err(|e| SdError::MalformedResponse(format!("iam token response: {}", e)))
    }
}

impl IssueToken for IamTokenIssuer {
    async fn issue_token(&self) -> Result<IamToken, SdError> {
        self.exchange().await
    }
}

impl std::fmt::Debug for IamTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamTokenIssuer")
            .field("endpoint", &self.endpoint)
            .field("service_account_id", &self.service_account_id)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}
