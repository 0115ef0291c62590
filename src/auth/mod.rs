//! Authentication Module
//! Mission: Secure API access with JWT tokens and role-based guards

pub mod api;
pub mod clock;
pub mod credentials;
pub mod guard;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use api::AuthState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use credentials::CredentialStore;
pub use guard::{guarded, ADMIN_ONLY, ANY_ROLE, STAFF};
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, CurrentUser, MaybeUser};
pub use models::{AuthContext, Role};
