//! Membership tiers and feature gating
//!
//! A user's effective tier is derived from their profile: lifetime-free
//! accounts and accounts with an unexpired benefit trial are treated as
//! Collector Pro, everyone else gets their stored membership tier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Result;

/// Feature key guarding the collection audit
pub const COLLECTION_AUDIT_FEATURE: &str = "collection_audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Collector,
    CollectorPro,
    Dealer,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Collector, Tier::CollectorPro, Tier::Dealer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Collector => "collector",
            Tier::CollectorPro => "collector_pro",
            Tier::Dealer => "dealer",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Collector => "Collector",
            Tier::CollectorPro => "Collector Pro",
            Tier::Dealer => "Dealer",
        }
    }

    /// Parse a stored tier name; unknown names fall back to `Collector`
    pub fn from_stored(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("collector_pro") => Tier::CollectorPro,
            Some("dealer") => Tier::Dealer,
            Some("collector") | Some("") | None => Tier::Collector,
            Some(other) => {
                warn!("Unknown membership tier '{}', treating as collector", other);
                Tier::Collector
            }
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum tier that unlocks each gated feature
pub const FEATURE_MIN_TIER: &[(&str, Tier)] = &[
    ("image_upload", Tier::CollectorPro),
    ("pdf_inserts", Tier::CollectorPro),
    ("public_sharing", Tier::CollectorPro),
    (COLLECTION_AUDIT_FEATURE, Tier::CollectorPro),
    ("advanced_statistics", Tier::CollectorPro),
    ("catalog_generator", Tier::Dealer),
    ("bulk_operations", Tier::Dealer),
    ("document_storage", Tier::Dealer),
    ("dealer_directory", Tier::Dealer),
    ("insurance_valuation_reports", Tier::Dealer),
];

/// Lookup for upgrade hints
pub fn feature_min_tier(feature: &str) -> Option<Tier> {
    FEATURE_MIN_TIER
        .iter()
        .find(|(key, _)| *key == feature)
        .map(|(_, tier)| *tier)
}

/// Stored profile fields relevant to tier resolution
#[derive(Debug, Clone, Default)]
pub struct MembershipProfile {
    pub membership_tier: Option<String>,
    pub is_lifetime_free: bool,
    pub benefit_expires_at: Option<DateTime<Utc>>,
}

impl MembershipProfile {
    pub fn effective_tier(&self, now: DateTime<Utc>) -> Tier {
        // Lifetime accounts get Pro, never Dealer
        if self.is_lifetime_free {
            return Tier::CollectorPro;
        }

        if matches!(self.benefit_expires_at, Some(expires) if expires > now) {
            return Tier::CollectorPro;
        }

        Tier::from_stored(self.membership_tier.as_deref())
    }
}

/// Load a user's profile, `None` when the user has none
pub async fn load_profile(pool: &SqlitePool, user_id: Uuid) -> Result<Option<MembershipProfile>> {
    let row = sqlx::query(
        "SELECT membership_tier, is_lifetime_free, benefit_expires_at FROM user_profiles WHERE id = ?",
    )
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| {
        let benefit: Option<String> = row.get("benefit_expires_at");
        MembershipProfile {
            membership_tier: row.get("membership_tier"),
            is_lifetime_free: row.get("is_lifetime_free"),
            benefit_expires_at: benefit.as_deref().and_then(parse_timestamp),
        }
    }))
}

/// Resolve the tier a user currently has access to
pub async fn effective_tier(pool: &SqlitePool, user_id: Uuid, now: DateTime<Utc>) -> Result<Tier> {
    let tier = match load_profile(pool, user_id).await? {
        Some(profile) => profile.effective_tier(now),
        None => Tier::Collector,
    };
    debug!(%user_id, tier = %tier, "Resolved effective tier");
    Ok(tier)
}

/// Check whether the user's effective tier enables a feature
pub async fn has_feature(
    pool: &SqlitePool,
    user_id: Uuid,
    feature: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    let tier = effective_tier(pool, user_id, now).await?;

    let enabled: Option<bool> =
        sqlx::query_scalar("SELECT enabled FROM tier_features WHERE tier = ? AND feature = ?")
            .bind(tier.as_str())
            .bind(feature)
            .fetch_optional(pool)
            .await?;

    Ok(enabled.unwrap_or(false))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring unparseable timestamp '{}': {}", value, e);
            None
        }
    }
}
