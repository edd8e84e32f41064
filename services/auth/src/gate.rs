//! Identity gate
//!
//! Every protected operation passes through here before touching domain
//! state: the bearer token is verified, the principal is re-read from storage
//! and its current standing is checked. Nothing is cached between calls, so a
//! block takes effect on the next request even while the token is still
//! cryptographically valid.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::GateError,
    jwt::{Claims, Domain, JwtService, TokenKind, TokenPair},
    models::{Admin, User},
    repositories::PrincipalStore,
};

/// Standing an operation requires from its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Not blocked
    Active,
    /// Not blocked and email verified (users only)
    Verified,
}

/// Resolved caller
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "domain", content = "principal", rename_all = "snake_case")]
pub enum Principal {
    User(User),
    Admin(Admin),
}

impl Principal {
    pub fn id(&self) -> Uuid {
        match self {
            Principal::User(user) => user.id,
            Principal::Admin(admin) => admin.id,
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Principal::User(_) => Domain::User,
            Principal::Admin(_) => Domain::Admin,
        }
    }
}

/// Resolves bearer credentials into principals
#[derive(Clone)]
pub struct IdentityGate {
    jwt: JwtService,
    principals: Arc<dyn PrincipalStore>,
}

impl IdentityGate {
    pub fn new(jwt: JwtService, principals: Arc<dyn PrincipalStore>) -> Self {
        Self { jwt, principals }
    }

    /// Token service backing this gate
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Resolve an access token into a principal in the required standing
    pub async fn authenticate(
        &self,
        domain: Domain,
        token: Option<&str>,
        standing: Standing,
    ) -> Result<Principal, GateError> {
        let token = token.ok_or(GateError::Unauthenticated)?;
        let claims = self.jwt.verify(domain, TokenKind::Access, token)?;
        let id = claims.payload.id;

        let principal = match domain {
            Domain::User => {
                let user = self
                    .principals
                    .find_user(id)
                    .await?
                    .ok_or(GateError::NotFound("User not found"))?;
                check_user_standing(&user, standing)?;
                Principal::User(user)
            }
            Domain::Admin => {
                let admin = self
                    .principals
                    .find_admin(id)
                    .await?
                    .ok_or(GateError::NotFound("Admin not found"))?;
                if admin.is_blocked {
                    warn!("Blocked admin {} rejected", admin.id);
                    return Err(GateError::Forbidden("Blocked user"));
                }
                Principal::Admin(admin)
            }
        };

        debug!("Authenticated {} principal {}", domain, id);
        Ok(principal)
    }

    /// [`authenticate`](Self::authenticate) in the user domain
    pub async fn authenticate_user(
        &self,
        token: Option<&str>,
        standing: Standing,
    ) -> Result<User, GateError> {
        match self.authenticate(Domain::User, token, standing).await? {
            Principal::User(user) => Ok(user),
            Principal::Admin(_) => Err(GateError::Unauthorized),
        }
    }

    /// [`authenticate`](Self::authenticate) in the admin domain
    pub async fn authenticate_admin(&self, token: Option<&str>) -> Result<Admin, GateError> {
        match self.authenticate(Domain::Admin, token, Standing::Active).await? {
            Principal::Admin(admin) => Ok(admin),
            Principal::User(_) => Err(GateError::Unauthorized),
        }
    }

    /// Exchange a refresh token for a new access/refresh pair
    ///
    /// Pure rotation, storage is not consulted; standing changes surface at
    /// the next [`authenticate`](Self::authenticate).
    pub fn refresh(&self, domain: Domain, token: Option<&str>) -> Result<TokenPair, GateError> {
        let token = token.ok_or(GateError::BadRequest("Refresh token required"))?;
        let pair = self.jwt.rotate(domain, token)?;
        info!("Rotated {} refresh token", domain);
        Ok(pair)
    }

    /// Verify a refresh token without rotating it
    pub fn check_refresh(&self, domain: Domain, token: Option<&str>) -> Result<Claims, GateError> {
        let token = token.ok_or(GateError::BadRequest("Refresh token required"))?;
        Ok(self.jwt.verify(domain, TokenKind::Refresh, token)?)
    }
}

fn check_user_standing(user: &User, standing: Standing) -> Result<(), GateError> {
    if user.is_blocked {
        warn!("Blocked user {} rejected", user.id);
        return Err(GateError::Forbidden("Blocked user"));
    }

    if standing == Standing::Verified && !user.is_verified {
        return Err(GateError::Forbidden("Unauthorized, not verified account"));
    }

    Ok(())
}
