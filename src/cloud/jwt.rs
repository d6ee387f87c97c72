//! Signed JWT assertions exchanged for IAM tokens (PS256, RSA-PSS with SHA-256).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand_core::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::pss::BlindedSigningKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::RsaPrivateKey;
use serde::Serialize;
use sha2::Sha256;

use crate::error::SdError;

/// Lifetime of the signed assertion, not of the issued IAM token.
pub const ASSERTION_TTL_SECONDS: i64 = 360;

const PEM_BEGIN: &str = "-----BEGIN";

#[derive(Debug, Serialize)]
struct JwtHeader<'a> {
    typ: &'static str,
    alg: &'static str,
    kid: &'a str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct AssertionClaims {
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(service_account_id: &str, audience: &str, issued_at: i64) -> Self {
        Self {
            aud: audience.to_owned(),
            iss: service_account_id.to_owned(),
            iat: issued_at,
            exp: issued_at + ASSERTION_TTL_SECONDS,
        }
    }
}

/// Parse an authorized-key private key.
///
/// Accepts PKCS#8 or PKCS#1 PEM. Anything before the PEM armour (the key file
/// carries an informational first line) is dropped, and escaped `\n` from
/// single-line environment values are unescaped.
pub fn parse_private_key(raw: &str) -> Result<RsaPrivateKey, SdError> {
    let unescaped = raw.replace("\\n", "\n");
    let pem = unescaped
        .find(PEM_BEGIN)
        .map(|start| &unescaped[start..])
        .ok_or_else(|| SdError::Key("no PEM block found".to_string()))?
        .trim();

    RsaPrivateKey::from_pkcs8_pem(pem)
        .or_else(|pkcs8_err| {
            RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|pkcs1_err| SdError::Key(format!("pkcs8: {}, pkcs1: {}", pkcs8_err, pkcs1_err)))
        })
}

/// Build and sign `header.claims.signature`.
pub fn sign_assertion(
    key: &RsaPrivateKey,
    key_id: &str,
    claims: &AssertionClaims,
) -> Result<String, SdError> {
    let header = JwtHeader { typ: "JWT", alg: "PS256", kid: key_id };
    let header = serde_json::to_vec(&header).map_err(|e| SdError::Key(e.to_string()))?;
    let claims = serde_json::to_vec(claims).map_err(|e| SdError::Key(e.to_string()))?;

    let signing_input = format!("{}.{}", URL_SAFE_NO_PAD.encode(header), URL_SAFE_NO_PAD.encode(claims));

    let signing_key = BlindedSigningKey::<Sha256>::new(key.clone());
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, signing_input.as_bytes())
        .map_err(|e| SdError::Key(format!("signing failed: {}", e)))?;

    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature.to_bytes())))
}
