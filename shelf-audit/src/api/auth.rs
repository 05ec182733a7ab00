//! Session middleware
//!
//! Resolves `Authorization: Bearer <token>` to an [`AuthenticatedUser`] and
//! stores it in the request extensions. Requests without a usable token pass
//! through anonymously; handlers decide what an anonymous caller may do.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use shelf_common::session::resolve_session;
use shelf_common::AuthenticatedUser;
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    if let Some(token) = bearer_token(&request) {
        match resolve_session(&state.db, &token, Utc::now()).await? {
            Some(user) => {
                debug!(user_id = %user.user_id, "Session resolved");
                request.extensions_mut().insert::<AuthenticatedUser>(user);
            }
            None => debug!("Bearer token did not match a live session"),
        }
    }

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
