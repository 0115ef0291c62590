//! Credential Store
//! Mission: Resolve login identities and run the password reset flow

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::models::{Identity, IdentityKind};
use crate::store::{Database, StoreError};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Identity lookups over both account tables
#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
    clock: Arc<dyn Clock>,
    reset_ttl: Duration,
}

impl CredentialStore {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            clock: Arc::new(SystemClock),
            reset_ttl: Duration::minutes(30),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_reset_ttl(mut self, ttl: Duration) -> Self {
        self.reset_ttl = ttl;
        self
    }

    /// Look up an identity by email. Managers shadow users with the same email.
    pub fn find_identity(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        if let Some(manager) = self.db.find_manager_by_email(email)? {
            return Ok(Some(Identity {
                id: manager.id,
                kind: IdentityKind::Manager,
                name: manager.name,
                email: manager.email,
                password_hash: manager.password_hash,
                role: manager.role,
            }));
        }

        let identity = self.db.find_user_by_email(email)?.map(|user| Identity {
            id: user.id,
            kind: IdentityKind::Customer,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        });
        Ok(identity)
    }

    /// Verify email and password. `None` for unknown email or wrong password.
    pub fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let Some(identity) = self.find_identity(email)? else {
            return Ok(None);
        };

        let valid = bcrypt::verify(password, &identity.password_hash)
            .map_err(|e| StoreError::Hashing(e.to_string()))?;

        Ok(valid.then_some(identity))
    }

    /// Issue a reset token when the email is known. Unknown emails yield
    /// `None` so callers can answer identically either way.
    pub fn request_password_reset(&self, email: &str) -> Result<Option<String>, StoreError> {
        if self.find_identity(email)?.is_none() {
            warn!("Password reset requested for unknown email {}", email);
            return Ok(None);
        }

        let now = self.clock.now().timestamp();
        self.db.purge_reset_tokens(now)?;

        let token = Uuid::new_v4().to_string();
        let expires_at = now + self.reset_ttl.num_seconds();
        self.db.insert_reset_token(&token, email, expires_at)?;

        // No mail transport; the token is delivered through the log
        info!("🔑 Password reset token for {}: {}", email, token);
        Ok(Some(token))
    }

    /// Consume `token` and set a new password. Returns false when the token
    /// is unknown, used or expired.
    pub fn reset_password(&self, token: &str, new_password: &str) -> Result<bool, StoreError> {
        let now = self.clock.now().timestamp();
        let Some(email) = self.db.consume_reset_token(token, now)? else {
            return Ok(false);
        };

        match self.find_identity(&email)? {
            Some(identity) if identity.kind == IdentityKind::Manager => {
                self.db.set_manager_password(&email, new_password)?
            }
            Some(_) => self.db.set_user_password(&email, new_password)?,
            None => return Ok(false),
        }

        info!("🔑 Password reset completed for {}", email);
        Ok(true)
    }
}
