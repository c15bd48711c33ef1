use std::sync::Arc;

use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::app::users::normalize_email;
use crate::domain::user::{Role, User};
use crate::infra::store::Store;

const TOKEN_ISSUER: &str = "agora";

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    access_key: [u8; 32],
    access_ttl_minutes: u64,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, access_key: [u8; 32], access_ttl_minutes: u64) -> Self {
        Self {
            store,
            access_key,
            access_ttl_minutes,
        }
    }

    /// Returns `None` for an unknown email or a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<(User, AccessToken)>> {
        let user = match self.store.find_user_by_email(&normalize_email(email)).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        if user.password_hash.is_empty() || !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        let token = self.issue_access_token(&user)?;
        Ok(Some((user, token)))
    }

    pub fn issue_access_token(&self, user: &User) -> Result<AccessToken> {
        let duration = std::time::Duration::from_secs(self.access_ttl_minutes * 60);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&user.id.to_string())?;
        claims.add_additional("typ", "access")?;
        claims.add_additional("role", user.role.as_db())?;

        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        let expires_at =
            OffsetDateTime::now_utc() + Duration::minutes(self.access_ttl_minutes as i64);

        Ok(AccessToken { token, expires_at })
    }

    /// Returns `None` for any token that fails decryption or claim checks.
    pub fn authenticate_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if claim_str(&claims, "typ") != Some("access") {
            return Ok(None);
        }
        let user_id = match claim_str(&claims, "sub").map(Uuid::parse_str) {
            Some(Ok(user_id)) => user_id,
            _ => return Ok(None),
        };
        let role = match claim_str(&claims, "role").and_then(Role::from_db) {
            Some(role) => role,
            None => return Ok(None),
        };

        Ok(Some(AuthSession { user_id, role }))
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn claim_str<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get_claim(name).and_then(|value| value.as_str())
}
