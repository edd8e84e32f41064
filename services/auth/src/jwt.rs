//! JWT service for issuing and verifying credentials
//!
//! Two principal domains (users and administrators) each carry their own
//! access and refresh secrets, so there are four signing keys in total. A
//! token minted under one domain/kind pair never verifies under another.
//! Tokens are stateless: there is no blacklist, a refresh token stays valid
//! for its full lifetime.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

/// Access tokens live one hour
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: u64 = 60 * 60;
/// Refresh tokens live one year
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: u64 = 365 * 24 * 60 * 60;

/// Registered claim names owned by the token service, never by the payload
pub const REGISTERED_CLAIMS: [&str; 4] = ["iat", "exp", "aud", "iss"];

/// Claim names carried by the typed fields of [`TokenPayload`]
pub const RECOGNISED_CLAIMS: [&str; 8] = [
    "id",
    "name",
    "email",
    "is_verified",
    "is_blocked",
    "forgot_password",
    "is_worker",
    "roles",
];

fn is_reserved(key: &str) -> bool {
    REGISTERED_CLAIMS.contains(&key) || RECOGNISED_CLAIMS.contains(&key)
}

/// Principal domain a token is minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    User,
    Admin,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::User => write!(f, "user"),
            Domain::Admin => write!(f, "admin"),
        }
    }
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Token failures
///
/// `Invalid` and `Expired` are kept apart for logging only; callers collapse
/// both into a single "unauthorized" answer.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Secret misconfiguration or an unencodable payload
    #[error("Failed to sign token: {0}")]
    Signing(String),

    /// Malformed token, bad signature, wrong issuer or wrong audience
    #[error("Invalid token")]
    Invalid,

    /// The token's expiry has elapsed
    #[error("Expired token")]
    Expired,
}

/// JWT configuration
///
/// Built once at startup and handed to [`JwtService::new`].
#[derive(Clone)]
pub struct JwtConfig {
    pub user_access_secret: String,
    pub user_refresh_secret: String,
    pub admin_access_secret: String,
    pub admin_refresh_secret: String,
    /// Issuer stamped on user-domain tokens
    pub user_issuer: String,
    /// Issuer stamped on admin-domain tokens
    pub admin_issuer: String,
    /// Access token expiration time in seconds (default: 1 hour)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 1 year)
    pub refresh_token_expiry: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("user_issuer", &self.user_issuer)
            .field("admin_issuer", &self.admin_issuer)
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish_non_exhaustive()
    }
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_USER_ACCESS_SECRET`, `JWT_USER_REFRESH_SECRET`: user-domain secrets
    /// - `JWT_ADMIN_ACCESS_SECRET`, `JWT_ADMIN_REFRESH_SECRET`: admin-domain secrets
    /// - `JWT_USER_ISSUER`: issuer for user tokens (default: "smurf-app.com")
    /// - `JWT_ADMIN_ISSUER`: issuer for admin tokens (default: "smurfApp.com")
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 3600)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 31536000)
    pub fn from_env() -> Result<Self> {
        let secret = |name: &str| {
            std::env::var(name)
                .map_err(|_| anyhow::anyhow!("{} environment variable not set", name))
        };

        let config = JwtConfig {
            user_access_secret: secret("JWT_USER_ACCESS_SECRET")?,
            user_refresh_secret: secret("JWT_USER_REFRESH_SECRET")?,
            admin_access_secret: secret("JWT_ADMIN_ACCESS_SECRET")?,
            admin_refresh_secret: secret("JWT_ADMIN_REFRESH_SECRET")?,
            user_issuer: std::env::var("JWT_USER_ISSUER")
                .unwrap_or_else(|_| "smurf-app.com".to_string()),
            admin_issuer: std::env::var("JWT_ADMIN_ISSUER")
                .unwrap_or_else(|_| "smurfApp.com".to_string()),
            access_token_expiry: std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRY),
            refresh_token_expiry: std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REFRESH_TOKEN_EXPIRY),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject empty or shared secrets
    pub fn validate(&self) -> Result<()> {
        let secrets = [
            ("JWT_USER_ACCESS_SECRET", &self.user_access_secret),
            ("JWT_USER_REFRESH_SECRET", &self.user_refresh_secret),
            ("JWT_ADMIN_ACCESS_SECRET", &self.admin_access_secret),
            ("JWT_ADMIN_REFRESH_SECRET", &self.admin_refresh_secret),
        ];

        for (name, value) in &secrets {
            if value.is_empty() {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        for (i, (left_name, left)) in secrets.iter().enumerate() {
            for (right_name, right) in &secrets[i + 1..] {
                if left == right {
                    anyhow::bail!("{} and {} must differ", left_name, right_name);
                }
            }
        }

        if self.user_issuer == self.admin_issuer {
            anyhow::bail!("user and admin issuers must differ");
        }

        Ok(())
    }

    fn secret(&self, domain: Domain, kind: TokenKind) -> &str {
        match (domain, kind) {
            (Domain::User, TokenKind::Access) => &self.user_access_secret,
            (Domain::User, TokenKind::Refresh) => &self.user_refresh_secret,
            (Domain::Admin, TokenKind::Access) => &self.admin_access_secret,
            (Domain::Admin, TokenKind::Refresh) => &self.admin_refresh_secret,
        }
    }

    fn issuer(&self, domain: Domain) -> &str {
        match domain {
            Domain::User => &self.user_issuer,
            Domain::Admin => &self.admin_issuer,
        }
    }

    fn expiry(&self, kind: TokenKind) -> u64 {
        match kind {
            TokenKind::Access => self.access_token_expiry,
            TokenKind::Refresh => self.refresh_token_expiry,
        }
    }
}

/// Caller-supplied subject payload
///
/// A handful of recognised fields cover both domains; anything else rides in
/// `extra` and round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Principal identifier, also used as the audience
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_blocked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forgot_password: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_worker: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenPayload {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            email: None,
            is_verified: None,
            is_blocked: None,
            forgot_password: None,
            is_worker: None,
            roles: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach an extension claim
    ///
    /// Registered names and names owned by the typed fields are ignored; set
    /// those fields directly.
    pub fn with_claim(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if !is_reserved(&key) {
            self.extra.insert(key, value.into());
        }
        self
    }

    /// Drop extension entries that would collide with another claim
    fn strip_reserved(&mut self) {
        self.extra.retain(|key, _| !is_reserved(key));
    }
}

/// Decoded token: the payload plus registered metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer, distinguishes the two domains
    pub iss: String,
    /// Audience, the principal the token was minted for
    pub aud: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    #[serde(flatten)]
    pub payload: TokenPayload,
}

impl Claims {
    /// Drop the registered metadata, keeping only the subject payload
    pub fn into_payload(self) -> TokenPayload {
        let mut payload = self.payload;
        payload.strip_reserved();
        payload
    }
}

/// Access and refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Current unix time in seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        config.validate()?;
        Ok(JwtService { config })
    }

    /// Sign an access token for the payload
    pub fn issue_access(&self, domain: Domain, payload: &TokenPayload) -> Result<String, TokenError> {
        self.issue_at(domain, TokenKind::Access, payload, unix_now())
    }

    /// Sign a refresh token for the payload
    pub fn issue_refresh(&self, domain: Domain, payload: &TokenPayload) -> Result<String, TokenError> {
        self.issue_at(domain, TokenKind::Refresh, payload, unix_now())
    }

    /// Sign an access and a refresh token for the same payload
    pub fn issue_pair(&self, domain: Domain, payload: &TokenPayload) -> Result<TokenPair, TokenError> {
        let now = unix_now();
        Ok(TokenPair {
            access_token: self.issue_at(domain, TokenKind::Access, payload, now)?,
            refresh_token: self.issue_at(domain, TokenKind::Refresh, payload, now)?,
        })
    }

    /// Sign a token as if the current time were `now`
    pub fn issue_at(
        &self,
        domain: Domain,
        kind: TokenKind,
        payload: &TokenPayload,
        now: u64,
    ) -> Result<String, TokenError> {
        let secret = self.config.secret(domain, kind);
        if secret.is_empty() {
            error!("No {} {:?} secret configured", domain, kind);
            return Err(TokenError::Signing(format!(
                "missing {} {:?} secret",
                domain, kind
            )));
        }

        let mut payload = payload.clone();
        payload.strip_reserved();

        let claims = Claims {
            iss: self.config.issuer(domain).to_string(),
            aud: payload.id.to_string(),
            iat: now,
            exp: now + self.config.expiry(kind),
            payload,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to sign {} {:?} token: {}", domain, kind, e);
            TokenError::Signing(e.to_string())
        })
    }

    /// Validate a token and return its claims
    pub fn verify(&self, domain: Domain, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(domain, kind, token, unix_now())
    }

    /// Validate a token against the clock reading `now`
    ///
    /// A token is valid strictly before its `exp`.
    pub fn verify_at(
        &self,
        domain: Domain,
        kind: TokenKind,
        token: &str,
        now: u64,
    ) -> Result<Claims, TokenError> {
        let secret = self.config.secret(domain, kind);

        // Expiry is checked below against `now` rather than the wall clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.issuer(domain)]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected {} {:?} token: {}", domain, kind, e);
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        if claims.aud != claims.payload.id.to_string() {
            debug!("Rejected {} {:?} token: audience mismatch", domain, kind);
            return Err(TokenError::Invalid);
        }

        if now >= claims.exp {
            debug!("Rejected {} {:?} token: expired at {}", domain, kind, claims.exp);
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// Exchange a refresh token for a fresh pair
    ///
    /// Pure rotation: the new tokens carry the old payload verbatim, nothing
    /// is re-read from storage.
    pub fn rotate(&self, domain: Domain, refresh_token: &str) -> Result<TokenPair, TokenError> {
        let claims = self.verify(domain, TokenKind::Refresh, refresh_token)?;
        let payload = claims.into_payload();
        self.issue_pair(domain, &payload)
    }

}
