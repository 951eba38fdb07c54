//! Append-only version chains for catalog items.
//!
//! Content changes never touch an existing row. Each update produces a new
//! row pointing at its predecessor through `parent_id`; exactly one row per
//! chain has `is_current_version = true`.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CatalogItem, CatalogItemPatch, NewCatalogItem};
use crate::tenancy::TenantScope;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Another writer superseded the parent between read and write
    #[error("catalog item {parent_id} was modified concurrently; reload and retry")]
    Stale { parent_id: Uuid },

    #[error("catalog item {id} is a superseded version; update {current_id} instead")]
    Superseded { id: Uuid, current_id: Uuid },

    #[error("catalog item {id} is deleted; restore it before updating")]
    Deleted { id: Uuid },
}

/// Outcome of planning an update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePlan {
    /// The patch changes nothing; `current` is returned as-is
    Unchanged(CatalogItem),
    /// Persist `next` as the new head of the chain
    NewVersion { parent_id: Uuid, next: CatalogItem },
}

/// Version 1 of a new chain
pub fn plan_create(
    scope: &TenantScope,
    item: NewCatalogItem,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> CatalogItem {
    let id = Uuid::new_v4();
    CatalogItem {
        id,
        tenant_id: scope.tenant_id,
        is_live: scope.is_live,
        original_id: id,
        parent_id: None,
        version_number: 1,
        is_current_version: true,
        name: item.name,
        description: item.description,
        item_type: item.item_type,
        category: item.category,
        sku: item.sku,
        pricing_type: item.pricing_type,
        unit_price: item.unit_price,
        currency: item.currency,
        tax_rate: item.tax_rate,
        duration_minutes: item.duration_minutes,
        image_url: item.image_url,
        status: item.status,
        is_active: true,
        created_by: actor,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

/// Successor of `target` with `patch` applied.
///
/// `current_id` is the id of the chain's head as seen by the caller; it is
/// only used to name the right row when `target` has been superseded.
pub fn plan_update(
    target: &CatalogItem,
    current_id: Uuid,
    patch: &CatalogItemPatch,
    actor: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<UpdatePlan, VersionError> {
    if !target.is_current_version {
        return Err(VersionError::Superseded { id: target.id, current_id });
    }
    if !target.is_active {
        return Err(VersionError::Deleted { id: target.id });
    }

    let mut next = target.clone();
    patch.apply_to(&mut next);
    if next.same_content(target) {
        return Ok(UpdatePlan::Unchanged(target.clone()));
    }

    next.id = Uuid::new_v4();
    next.parent_id = Some(target.id);
    next.version_number = target.version_number + 1;
    next.is_current_version = true;
    next.created_by = actor.or(target.created_by);
    next.updated_at = now;
    Ok(UpdatePlan::NewVersion { parent_id: target.id, next })
}
