//! HS256 access tokens.

use chrono::{Duration, Utc};
use domains::{AccessTokens, AppError, Id, Result, User};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ACCESS: &str = "access";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
    pub token_type: String,
}

pub struct JwtTokens {
    enc: EncodingKey,
    dec: DecodingKey,
    ttl: Duration,
}

impl JwtTokens {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn decode(&self, token: &str) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        jsonwebtoken::decode::<Claims>(token, &self.dec, &validation).map(|d| d.claims)
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Unauthorized(message.into())
}

impl AccessTokens for JwtTokens {
    fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: ACCESS.into(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.enc)
            .map_err(AppError::internal)
    }

    fn verify(&self, token: &str) -> Result<Id> {
        let claims = self.decode(token).map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => unauthorized("Token is expired."),
            _ => unauthorized("Given token not valid for any token type."),
        })?;
        if claims.token_type != ACCESS {
            return Err(unauthorized("Token has wrong type."));
        }
        claims
            .sub
            .parse()
            .map_err(|_| unauthorized("Token contained no recognizable user identification."))
    }
}
