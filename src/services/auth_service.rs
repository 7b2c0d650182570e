use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{LoginResponse, Session, SessionClaims};

/// Single shared credential pair guarding the ledger.
///
/// Only an argon2 hash of the configured password is kept in memory. Sessions
/// are stateless HS256 tokens whose issue time records when the credentials
/// were checked.
pub struct AuthService {
    username: String,
    password_hash: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        username: &str,
        password: &str,
        secret: &[u8],
        session_ttl: Duration,
    ) -> Result<Self, AppError> {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
            .map_err(|e| AppError::Config(format!("salt generation failed: {}", e)))?;
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Config(format!("password hashing failed: {}", e)))?
            .to_string();

        Ok(Self {
            username: username.to_string(),
            password_hash,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            session_ttl,
        })
    }

    fn credentials_match(&self, username: &str, password: &str) -> bool {
        if username != self.username {
            return false;
        }
        match PasswordHash::new(&self.password_hash) {
            Ok(hash) => Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                false
            }
        }
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        self.login_at(username, password, Utc::now())
    }

    fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<LoginResponse, AppError> {
        if !self.credentials_match(username, password) {
            warn!("Rejected login for user '{}'", username);
            return Err(AppError::Unauthorized);
        }

        let expires_at = now + self.session_ttl;
        let claims = SessionClaims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Config(format!("token signing failed: {}", e)))?;

        info!("User '{}' logged in", username);
        Ok(LoginResponse { token, expires_at })
    }

    /// Turns a bearer token back into the session it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<Session, AppError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|_| AppError::Unauthorized)?;

        let checked_at = DateTime::from_timestamp(data.claims.iat, 0)
            .ok_or(AppError::Unauthorized)?;

        Ok(Session {
            username: data.claims.sub,
            authenticated: true,
            checked_at,
        })
    }
}
