//! Creating and verifying the JWTs that carry a user's session.
//!
//! A session is made of two tokens. The access token is short-lived and authorizes individual
//! requests. The refresh token is long-lived and may only be exchanged for a new access token.

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Error, UserID};

/// Whether a token authorizes requests or mints new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The claims stored in every token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserID,
    pub kind: TokenKind,
    /// A unique token ID, used to revoke refresh tokens.
    pub jti: String,
    /// Issued at, as a UNIX timestamp.
    pub iat: i64,
    /// Expiry, as a UNIX timestamp.
    pub exp: i64,
}

impl Claims {
    /// The expiry as a date-time.
    pub fn expires_at(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.exp).unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

/// The keys for signing and verifying tokens, derived from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl std::fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JwtKeys { .. }")
    }
}

/// How long each kind of token stays valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenConfig {
    /// The lifetime of the short-lived token sent with every request.
    pub access_token_duration: Duration,
    /// The lifetime of the token used to issue new access tokens.
    pub refresh_token_duration: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_duration: Duration::minutes(5),
            refresh_token_duration: Duration::days(7),
        }
    }
}

/// An encoded token and the claims inside it.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub claims: Claims,
}

/// A freshly issued access token and refresh token for the same user.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: SignedToken,
    pub refresh: SignedToken,
}

/// Create a signed token of `kind` for `user_id` that expires after `duration`.
///
/// # Errors
///
/// Returns [Error::TokenError] if the token could not be encoded.
pub fn create_token(
    user_id: UserID,
    kind: TokenKind,
    duration: Duration,
    keys: &JwtKeys,
) -> Result<SignedToken, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        user_id,
        kind,
        jti: Uuid::new_v4().to_string(),
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|error| Error::TokenError(format!("could not encode token: {error}")))?;

    Ok(SignedToken { token, claims })
}

/// Create an access token and a refresh token for `user_id`.
///
/// # Errors
///
/// Returns [Error::TokenError] if either token could not be encoded.
pub fn create_token_pair(
    user_id: UserID,
    config: &TokenConfig,
    keys: &JwtKeys,
) -> Result<TokenPair, Error> {
    Ok(TokenPair {
        access: create_token(
            user_id,
            TokenKind::Access,
            config.access_token_duration,
            keys,
        )?,
        refresh: create_token(
            user_id,
            TokenKind::Refresh,
            config.refresh_token_duration,
            keys,
        )?,
    })
}

/// Verify `token` and return its claims.
///
/// # Errors
///
/// Returns [Error::TokenError] if the signature is invalid, the token has expired, or it is
/// not of the `expected` kind.
pub fn decode_token(token: &str, expected: TokenKind, keys: &JwtKeys) -> Result<Claims, Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &keys.decoding, &validation)
        .map_err(|error| match error.kind() {
            ErrorKind::ExpiredSignature => Error::TokenError("token has expired".to_owned()),
            _ => Error::TokenError(format!("invalid token: {error}")),
        })?
        .claims;

    if claims.kind != expected {
        return Err(Error::TokenError(format!(
            "expected {expected:?} token, got {:?} token",
            claims.kind
        )));
    }

    Ok(claims)
}
