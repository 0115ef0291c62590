//! JWT Token Handler
//! Mission: Issue and validate signed, time-bounded tokens

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::models::{Claims, Identity};
use anyhow::{Context, Result};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Why a presented token could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, garbage, unknown role claim or no subject
    Malformed,
    /// Signature verified but `exp` is not in the future
    Expired { subject: String },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::Expired { subject } => write!(f, "Expired Token (subject {})", subject),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: String,
    expiration: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration: Duration::hours(24), // 24-hour tokens by default
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Generate a JWT token for an identity. Returns the token and its
    /// lifetime in seconds.
    pub fn generate_token(&self, identity: &Identity) -> Result<(String, u64)> {
        let now = self.clock.now();
        let expiration = now
            .checked_add_signed(self.expiration)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: identity.email.clone(),
            authorities: vec![identity.role],
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        debug!(
            "Generating JWT for {} ({}), expires at {}",
            identity.email, identity.role, expiration
        );

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, self.expiration.num_seconds().max(0) as u64))
    }

    /// Verify the signature and parse claims without judging expiry.
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|_| TokenError::Malformed)?;

        if decoded.claims.sub.trim().is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(decoded.claims)
    }

    /// True once the clock has reached `exp`
    pub fn is_expired(&self, claims: &Claims) -> bool {
        claims.exp <= self.clock.now().timestamp()
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode_claims(token)?;

        if self.is_expired(&claims) {
            return Err(TokenError::Expired {
                subject: claims.sub,
            });
        }

        debug!("Validated JWT for {}", claims.sub);

        Ok(claims)
    }
}
