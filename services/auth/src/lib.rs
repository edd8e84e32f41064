//! Authentication for the marketplace
//!
//! Two independent principal domains, users and administrators, each with
//! short-lived access tokens and long-lived refresh tokens. [`jwt`] issues
//! and verifies the credentials; [`gate`] turns a bearer credential into a
//! principal in good standing for every protected operation.

pub mod error;
pub mod gate;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;

pub use error::GateError;
pub use gate::{IdentityGate, Principal, Standing};
pub use jwt::{Claims, Domain, JwtConfig, JwtService, TokenError, TokenKind, TokenPair, TokenPayload};
