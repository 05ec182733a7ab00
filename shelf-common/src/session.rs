//! Session lookup
//!
//! Sessions are issued elsewhere; this module only maps a bearer token to the
//! user it belongs to. Tokens are stored as lowercase hex SHA-256 digests.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;

/// Identity of the caller, resolved from a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Digest under which a token is stored
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Resolve a bearer token to its user
///
/// Returns `Ok(None)` for unknown, expired or malformed sessions.
pub async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Option<AuthenticatedUser>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let row = sqlx::query("SELECT user_id, expires_at FROM user_sessions WHERE token_hash = ?")
        .bind(hash_token(token))
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        debug!("Session token not found");
        return Ok(None);
    };

    let user_id: String = row.get("user_id");
    let expires_at: String = row.get("expires_at");

    let expires_at = match DateTime::parse_from_rfc3339(&expires_at) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            warn!("Session has unparseable expiry '{}': {}", expires_at, e);
            return Ok(None);
        }
    };
    if expires_at <= now {
        debug!("Session expired at {}", expires_at);
        return Ok(None);
    }

    match Uuid::parse_str(&user_id) {
        Ok(user_id) => Ok(Some(AuthenticatedUser::new(user_id))),
        Err(e) => {
            warn!("Session references invalid user id '{}': {}", user_id, e);
            Ok(None)
        }
    }
}

/// Store a session for `token`, replacing any existing one
pub async fn store_session(
    pool: &SqlitePool,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT OR REPLACE INTO user_sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)",
    )
    .bind(hash_token(token))
    .bind(user_id.to_string())
    .bind(expires_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}
