//! Service account authentication (OAuth 2.0 JWT bearer grant).

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::DriveError;
use crate::config::CredentialSource;
use crate::constants::{ASSERTION_LIFETIME_SECS, DEFAULT_TOKEN_URI, DRIVE_SCOPE};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"***REDACTED***")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    error_description: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, DriveError> {
        let key: Self =
            serde_json::from_str(raw).map_err(|e| DriveError::Credential(e.to_string()))?;
        if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
            return Err(DriveError::Credential(
                "client_email and private_key must be set".to_string(),
            ));
        }
        Ok(key)
    }

    pub fn load(source: &CredentialSource) -> Result<Self, DriveError> {
        match source {
            CredentialSource::Inline(raw) => Self::from_json(raw),
            CredentialSource::File(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| DriveError::ReadKey {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_json(&raw)
            }
        }
    }

    /// RS256-signed assertion asking for Drive scope, valid for one hour from `now`.
    pub fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, DriveError> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: DRIVE_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}

/// Exchange a freshly signed assertion for a bearer token.
pub async fn fetch_access_token(
    http: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, DriveError> {
    let assertion = key.sign_assertion(Utc::now())?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let token: TokenResponse = response.json().await?;
        return Ok(token.access_token);
    }

    let message = match response.json::<TokenError>().await {
        Ok(err) => err.error_description.unwrap_or(err.error),
        Err(_) => "unreadable error response".to_string(),
    };
    Err(DriveError::Token {
        status: status.as_u16(),
        message,
    })
}
