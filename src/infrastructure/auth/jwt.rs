use crate::domain::errors::AuthError;
use crate::domain::ports::token_verifier::TokenVerifier;
use crate::domain::ports::user_repository::UserRepository;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims carried by session bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Issue a bearer token for a user. Lives with the session subsystem; kept here
/// so both sides agree on the claim layout.
pub fn issue_token(
    secret: &[u8],
    algorithm: Algorithm,
    user_id: &Uuid,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        user_id: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(algorithm),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

/// Verifies HMAC-signed bearer tokens and checks that the user still exists
pub struct JwtTokenVerifier {
    secret: Vec<u8>,
    algorithm: Algorithm,
    users: Arc<dyn UserRepository>,
}

impl JwtTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>, algorithm: Algorithm, users: Arc<dyn UserRepository>) -> Self {
        Self {
            secret: secret.into(),
            algorithm,
            users,
        }
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(self.algorithm);
        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => AuthError::Malformed,
                _ => AuthError::Invalid,
            })
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.decode_claims(token)?;
        let user_id = Uuid::parse_str(&claims.user_id).map_err(|_| AuthError::Malformed)?;

        match self.users.get_user_by_id(&user_id).await {
            Ok(Some(_)) => Ok(user_id),
            Ok(None) => Err(AuthError::UserNotFound),
            Err(e) => Err(AuthError::Internal(e.to_string())),
        }
    }
}
