use chrono::{DateTime, Duration, Utc};

use crate::cloud::model::CreateIamTokenResponse;

/// Short-lived bearer credential issued by the identity endpoint.
///
/// Never mutated: an expired token is replaced wholesale by a fresh one.
#[derive(Clone, PartialEq, Eq)]
pub struct IamToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl IamToken {
    pub fn new(value: String, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    /// Usable only while `now < expires_at`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Valid at `now` and still valid `margin_seconds` later.
    pub fn is_valid_with_margin(&self, now: DateTime<Utc>, margin_seconds: u64) -> bool {
        i64::try_from(margin_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|margin| now.checked_add_signed(margin))
            .is_some_and(|deadline| self.is_valid(now) && self.is_valid(deadline))
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl From<CreateIamTokenResponse> for IamToken {
    fn from(response: CreateIamTokenResponse) -> Self {
        Self::new(response.iam_token, response.expires_at)
    }
}

// keep the credential out of logs
impl std::fmt::Debug for IamToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
