//! Authentication Models
//! Mission: Define identities, roles, token claims and the per-request context

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Roles for RBAC. Closed set, validated when crossing the system boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Client,  // Places orders, manages own account
    Manager, // Runs a restaurant: menu, orders, payments
    Admin,   // Full access to all endpoints
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Client, Role::Manager, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Manager => "MANAGER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for any role string outside the closed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRole(pub String);

impl fmt::Display for InvalidRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: {:?} (expected CLIENT, MANAGER or ADMIN)", self.0)
    }
}

impl std::error::Error for InvalidRole {}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Role::Client),
            "MANAGER" => Ok(Role::Manager),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = InvalidRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// Which table an identity was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    Customer,
    Manager,
}

/// A principal that can log in. Customers and managers share this shape;
/// `kind` tells them apart.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub id: i64,
    pub kind: IdentityKind,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // subject (email)
    pub authorities: Vec<Role>,
    pub iat: i64,
    pub exp: i64, // expiration timestamp (unix seconds)
}

/// Authenticated context for a single request.
///
/// Built by the token filter from a valid token and stored in the request
/// extensions. Its absence means the request is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    identity: String,
    roles: BTreeSet<Role>,
}

impl AuthContext {
    pub fn new(identity: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            identity: identity.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub.clone(), claims.authorities.iter().copied())
    }

    /// Email of the authenticated principal
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|r| self.roles.contains(r))
    }

    pub fn is_staff(&self) -> bool {
        self.roles.iter().any(Role::is_staff)
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64, // seconds until expiration
    pub role: Role,
    pub identity: IdentityResponse,
}

/// Identity response (sanitized)
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub kind: IdentityKind,
}

impl IdentityResponse {
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            email: identity.email.clone(),
            name: identity.name.clone(),
            role: identity.role,
            kind: identity.kind,
        }
    }
}

/// Response for GET /api/auth/me
#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub email: String,
    pub roles: Vec<Role>,
}

impl ContextResponse {
    pub fn from_context(ctx: &AuthContext) -> Self {
        Self {
            email: ctx.identity().to_string(),
            roles: ctx.roles().iter().copied().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let admin = Role::Admin;
        let json = serde_json::to_string(&admin).unwrap();
        assert_eq!(json, r#""ADMIN""#);

        let manager: Role = serde_json::from_str(r#""manager""#).unwrap();
        assert_eq!(manager, Role::Manager);
    }

    #[test]
    fn test_unknown_role_rejected_at_deserialization() {
        let err = serde_json::from_str::<Role>(r#""SUPERUSER""#).unwrap_err();
        assert!(err.to_string().contains("invalid role"));

        assert_eq!(
            "owner".parse::<Role>(),
            Err(InvalidRole("owner".to_string()))
        );
    }

    #[test]
    fn test_role_string_conversion() {
        assert_eq!(Role::Client.as_str(), "CLIENT");
        assert_eq!(Role::Manager.as_str(), "MANAGER");
        assert_eq!(Role::Admin.as_str(), "ADMIN");

        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("CLIENT".parse::<Role>(), Ok(Role::Client));
    }

    #[test]
    fn test_role_names_are_exact() {
        assert!("admin".parse::<Role>().is_err());
        assert!(" ADMIN ".parse::<Role>().is_err());
        assert!("Client".parse::<Role>().is_err());
    }

    #[test]
    fn test_context_role_checks() {
        let ctx = AuthContext::new("bob@example.com", [Role::Client]);
        assert_eq!(ctx.identity(), "bob@example.com");
        assert!(ctx.has_role(Role::Client));
        assert!(!ctx.has_any_role(&[Role::Admin, Role::Manager]));
        assert!(!ctx.is_staff());

        let staff = AuthContext::new("carol@example.com", [Role::Manager]);
        assert!(staff.is_staff());
    }

    #[test]
    fn test_identity_hash_not_serialized() {
        let identity = Identity {
            id: 1,
            kind: IdentityKind::Manager,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: Role::Manager,
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["kind"], "manager");
    }
}
