//! Collection audit endpoint
//!
//! GET /api/audit runs the audit for the session's user. Access requires the
//! `collection_audit` feature on the user's effective membership tier.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde::Serialize;
use shelf_common::tier::{self, feature_min_tier, COLLECTION_AUDIT_FEATURE};
use shelf_common::AuthenticatedUser;
use tracing::{info, warn};

use crate::audit::{AuditResult, CollectionAuditor, ScoreBand};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Audit result plus display summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResponse {
    #[serde(flatten)]
    pub audit: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<ScoreBand>,
    pub categories_with_issues: usize,
}

impl From<AuditResult> for AuditResponse {
    fn from(audit: AuditResult) -> Self {
        let band = audit.is_ok().then(|| audit.band());
        let categories_with_issues = audit.categories_with_issues();
        Self {
            audit,
            band,
            categories_with_issues,
        }
    }
}

/// GET /api/audit
pub async fn get_collection_audit(
    State(state): State<AppState>,
    user: Option<Extension<AuthenticatedUser>>,
) -> ApiResult<(StatusCode, Json<AuditResponse>)> {
    let auditor = CollectionAuditor::new(&*state.books, &*state.related)
        .with_page_size(state.book_page_size);

    let Some(Extension(user)) = user else {
        let result = auditor.run(None).await;
        return Ok((StatusCode::UNAUTHORIZED, Json(result.into())));
    };

    if !tier::has_feature(&state.db, user.user_id, COLLECTION_AUDIT_FEATURE, Utc::now()).await? {
        let required = feature_min_tier(COLLECTION_AUDIT_FEATURE);
        warn!(user_id = %user.user_id, "Collection audit locked for tier");
        return Err(ApiError::FeatureLocked {
            feature: COLLECTION_AUDIT_FEATURE.to_string(),
            required_tier: required.map(|t| t.display_name().to_string()),
            message: match required {
                Some(t) => format!("Collection audit requires the {} plan", t.display_name()),
                None => "Collection audit is not available on your plan".to_string(),
            },
        });
    }

    let result = auditor.run(Some(&user)).await;
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let response = AuditResponse::from(result);
    info!(
        user_id = %user.user_id,
        status = status.as_u16(),
        band = ?response.band,
        categories_with_issues = response.categories_with_issues,
        "Served collection audit"
    );

    Ok((status, Json(response)))
}
