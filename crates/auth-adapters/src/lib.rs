//! # auth-adapters
//!
//! Confirmation codes and access tokens behind the `domains` ports.

pub mod confirmation;
#[cfg(feature = "auth-jwt")]
pub mod jwt;

pub use confirmation::HmacCodes;
#[cfg(feature = "auth-jwt")]
pub use jwt::JwtTokens;
