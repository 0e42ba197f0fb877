//! Admin token authentication.
//!
//! A single administrator identity, configured at startup, exchanges its
//! credentials for an HS256 JWT. Tokens are stateless: anything carrying a
//! valid signature and an unexpired `exp` is an admin.

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// Subject claim for admin tokens.
pub const ADMIN_SUBJECT: &str = "admin";

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_TOKEN: &str = "Invalid or expired token";

/// JWT claims carried by an admin token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Always `"admin"`.
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Response body for a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until expiry.
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenAuthenticator {
    admin_email: String,
    admin_password: String,
    ttl: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenAuthenticator {
    /// Create an authenticator with HMAC-SHA256 signing.
    pub fn new(
        admin_email: impl Into<String>,
        admin_password: impl Into<String>,
        jwt_secret: &[u8],
        ttl: Duration,
    ) -> Self {
        Self {
            admin_email: admin_email.into().trim().to_string(),
            admin_password: admin_password.into(),
            ttl,
            encoding_key: EncodingKey::from_secret(jwt_secret),
            decoding_key: DecodingKey::from_secret(jwt_secret),
        }
    }

    /// Exchange admin credentials for a token.
    ///
    /// Email matches case-insensitively; the password is compared in
    /// constant time. Wrong email and wrong password fail identically.
    pub fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let email_ok = email.trim().to_lowercase() == self.admin_email.to_lowercase();
        let password_ok: bool = password
            .as_bytes()
            .ct_eq(self.admin_password.as_bytes())
            .into();

        if !(email_ok & password_ok) {
            debug!("admin login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
        }

        let response = self.issue_at(Utc::now().timestamp())?;
        info!("admin logged in");
        Ok(response)
    }

    /// Sign a token as if issued at `iat`.
    pub fn issue_at(&self, iat: i64) -> AppResult<TokenResponse> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = AdminClaims {
            sub: ADMIN_SUBJECT.to_string(),
            email: self.admin_email.clone(),
            iat,
            exp: iat.saturating_add(ttl),
        };

        let access_token =
            jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
                .context("failed to sign admin token")?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer",
            expires_in: ttl,
        })
    }

    /// Check signature, expiry and subject.
    pub fn verify(&self, token: &str) -> AppResult<AdminClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = jsonwebtoken::decode::<AdminClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!(error = %e, "admin token rejected");
                AppError::Unauthorized(INVALID_TOKEN)
            })?;

        if data.claims.sub != ADMIN_SUBJECT {
            return Err(AppError::Unauthorized(INVALID_TOKEN));
        }
        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("admin_email", &self.admin_email)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
