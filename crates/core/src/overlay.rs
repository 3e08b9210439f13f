//! Scenario overlay: merging public rows with scenario-private edits.
//!
//! A scenario sees the shared dataset through its urban-object links. Each
//! link slot points either at a public row or at a private row owned by the
//! scenario. Reads merge three branches (public, locked public, private);
//! writes resolve whether the target is already private or has to be copied
//! out of the public dataset first.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::CoreError;
use crate::geometry::{geometry_from_geojson, geometry_to_geojson, TerritoryShape};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Link slots
// ---------------------------------------------------------------------------

/// The three object slots carried by an urban-object link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectSlot {
    PhysicalObject,
    Geometry,
    Service,
}

impl ObjectSlot {
    pub fn entity(self) -> &'static str {
        match self {
            ObjectSlot::PhysicalObject => "physical object",
            ObjectSlot::Geometry => "object geometry",
            ObjectSlot::Service => "service",
        }
    }
}

/// Where a link slot points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRef {
    /// A row of the shared dataset.
    Public(DbId),
    /// A row owned by the scenario. `shadows` is the public row it overrides,
    /// `None` for objects created inside the scenario.
    Private { id: DbId, shadows: Option<DbId> },
}

impl SlotRef {
    fn from_columns(
        slot: ObjectSlot,
        link_id: DbId,
        public_id: Option<DbId>,
        private_id: Option<DbId>,
        shadows: Option<DbId>,
    ) -> Result<Option<Self>, CoreError> {
        match (public_id, private_id) {
            (Some(id), None) => Ok(Some(SlotRef::Public(id))),
            (None, Some(id)) => Ok(Some(SlotRef::Private { id, shadows })),
            (None, None) => Ok(None),
            (Some(_), Some(_)) => Err(CoreError::Internal(format!(
                "Urban object link {link_id} references both a public and a private {}",
                slot.entity()
            ))),
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, SlotRef::Private { .. })
    }

    /// Id of the row the slot points at, regardless of source.
    pub fn id(&self) -> DbId {
        match *self {
            SlotRef::Public(id) | SlotRef::Private { id, .. } => id,
        }
    }

    pub fn source(&self) -> Source {
        match self {
            SlotRef::Public(_) => Source::Public,
            SlotRef::Private { .. } => Source::Private,
        }
    }
}

/// Nullable columns of a `scenario_urban_objects` row, joined with the
/// back-references of the private rows it points at.
#[derive(Debug, Clone, Default)]
pub struct LinkColumns {
    pub id: DbId,
    pub scenario_id: DbId,
    pub public_urban_object_id: Option<DbId>,
    pub physical_object_id: Option<DbId>,
    pub public_physical_object_id: Option<DbId>,
    pub physical_object_shadows: Option<DbId>,
    pub object_geometry_id: Option<DbId>,
    pub public_object_geometry_id: Option<DbId>,
    pub object_geometry_shadows: Option<DbId>,
    pub service_id: Option<DbId>,
    pub public_service_id: Option<DbId>,
    pub service_shadows: Option<DbId>,
}

/// A validated urban-object link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrbanObjectLink {
    pub id: DbId,
    pub scenario_id: DbId,
    pub public_urban_object_id: Option<DbId>,
    pub physical_object: SlotRef,
    pub object_geometry: SlotRef,
    pub service: Option<SlotRef>,
}

impl TryFrom<LinkColumns> for UrbanObjectLink {
    type Error = CoreError;

    fn try_from(row: LinkColumns) -> Result<Self, Self::Error> {
        let required = |slot: ObjectSlot, value: Option<SlotRef>| {
            value.ok_or_else(|| {
                CoreError::Internal(format!(
                    "Urban object link {} has no {}",
                    row.id,
                    slot.entity()
                ))
            })
        };

        let physical_object = SlotRef::from_columns(
            ObjectSlot::PhysicalObject,
            row.id,
            row.public_physical_object_id,
            row.physical_object_id,
            row.physical_object_shadows,
        )?;
        let object_geometry = SlotRef::from_columns(
            ObjectSlot::Geometry,
            row.id,
            row.public_object_geometry_id,
            row.object_geometry_id,
            row.object_geometry_shadows,
        )?;
        let service = SlotRef::from_columns(
            ObjectSlot::Service,
            row.id,
            row.public_service_id,
            row.service_id,
            row.service_shadows,
        )?;

        Ok(Self {
            id: row.id,
            scenario_id: row.scenario_id,
            public_urban_object_id: row.public_urban_object_id,
            physical_object: required(ObjectSlot::PhysicalObject, physical_object)?,
            object_geometry: required(ObjectSlot::Geometry, object_geometry)?,
            service,
        })
    }
}

impl UrbanObjectLink {
    pub fn slot(&self, slot: ObjectSlot) -> Option<SlotRef> {
        match slot {
            ObjectSlot::PhysicalObject => Some(self.physical_object),
            ObjectSlot::Geometry => Some(self.object_geometry),
            ObjectSlot::Service => self.service,
        }
    }
}

// ---------------------------------------------------------------------------
// Conflict & lock detection
// ---------------------------------------------------------------------------

/// True when one of `links` already shadows `public_object_id` in `slot`
/// with a private row.
pub fn has_conflict(links: &[UrbanObjectLink], public_object_id: DbId, slot: ObjectSlot) -> bool {
    links.iter().any(|link| {
        matches!(
            link.slot(slot),
            Some(SlotRef::Private { shadows: Some(shadowed), .. }) if shadowed == public_object_id
        )
    })
}

/// An inherited object is locked when its geometry no longer intersects the
/// project territory. Without a territory (regional scenarios) nothing is
/// locked.
pub fn is_locked(geometry: &geo::Geometry<f64>, territory: Option<&TerritoryShape>) -> bool {
    territory.is_some_and(|t| !t.intersects(geometry))
}

/// Per-request context every resolver needs: which scenario, and the
/// project territory it is checked against.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project_id: DbId,
    pub scenario_id: DbId,
    pub territory: Option<TerritoryShape>,
}

impl ProjectContext {
    /// Reject writes against a locked public object.
    pub fn ensure_not_locked(&self, geometry: Option<&serde_json::Value>) -> Result<(), CoreError> {
        let Some(value) = geometry else {
            return Ok(());
        };
        let geometry = geometry_from_geojson(value)?;
        if is_locked(&geometry, self.territory.as_ref()) {
            return Err(CoreError::BadRequest(
                "object is locked: its geometry lies outside the project territory".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Write target resolution
// ---------------------------------------------------------------------------

/// What a scenario-scoped write must act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteTarget {
    /// Update the scenario's own row in place.
    Private(DbId),
    /// Copy the public row, apply the write to the copy and repoint `link_ids`.
    CopyOnWrite { public_id: DbId, link_ids: Vec<DbId> },
}

/// Resolve which row a write addressed by `object_id` touches.
pub fn resolve_write_target(
    links: &[UrbanObjectLink],
    slot: ObjectSlot,
    object_id: DbId,
    is_scenario_object: bool,
) -> Result<WriteTarget, CoreError> {
    if is_scenario_object {
        let owned = links.iter().any(|link| {
            matches!(link.slot(slot), Some(SlotRef::Private { id, .. }) if id == object_id)
        });
        return if owned {
            Ok(WriteTarget::Private(object_id))
        } else {
            Err(CoreError::NotFound { entity: slot.entity(), id: object_id })
        };
    }

    if has_conflict(links, object_id, slot) {
        return Err(CoreError::already_edited(slot.entity(), object_id));
    }

    let link_ids: Vec<DbId> = links
        .iter()
        .filter(|link| link.slot(slot) == Some(SlotRef::Public(object_id)))
        .map(|link| link.id)
        .collect();
    if link_ids.is_empty() {
        return Err(CoreError::NotFound { entity: slot.entity(), id: object_id });
    }
    Ok(WriteTarget::CopyOnWrite { public_id: object_id, link_ids })
}

/// Copy-on-write check for rows owned directly by a scenario (functional
/// zones, indicator values) rather than through links.
pub fn check_public_override(
    entity: &'static str,
    public_id: DbId,
    public_exists: bool,
    already_shadowed: bool,
) -> Result<(), CoreError> {
    if already_shadowed {
        return Err(CoreError::already_edited(entity, public_id));
    }
    if !public_exists {
        return Err(CoreError::NotFound { entity, id: public_id });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read overlay
// ---------------------------------------------------------------------------

/// Whether a row comes from the shared dataset or from the scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    Public,
    Private,
}

/// One row offered to the resolver, before branch assignment.
#[derive(Debug, Clone)]
pub struct OverlayCandidate<T> {
    pub source: Source,
    pub id: DbId,
    /// GeoJSON used for the lock check and clipping.
    pub geometry: Option<serde_json::Value>,
    pub is_deleted: bool,
    pub item: T,
}

/// One row of the merged view.
#[derive(Debug, Clone, Serialize)]
pub struct OverlayEntry<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<serde_json::Value>,
    pub is_scenario_object: bool,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Branch {
    Public,
    Locked,
    Private,
}

/// Merge `candidates` into the scenario's view.
///
/// Rows for the same `(source, id)` are collapsed to the first occurrence.
/// Tombstoned private rows are omitted. Public rows that still intersect the
/// territory come first with clipped geometry, then locked public rows with
/// geometry untouched, then private rows; each branch ordered by id.
pub fn resolve_overlay<T>(
    candidates: Vec<OverlayCandidate<T>>,
    ctx: &ProjectContext,
) -> Result<Vec<OverlayEntry<T>>, CoreError> {
    let territory = ctx.territory.as_ref();
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if candidate.is_deleted || !seen.insert((candidate.source, candidate.id)) {
            continue;
        }

        let (branch, geometry) = match candidate.source {
            Source::Private => (Branch::Private, candidate.geometry),
            Source::Public => match (candidate.geometry, territory) {
                (Some(value), Some(territory)) => {
                    let parsed = geometry_from_geojson(&value).map_err(|e| {
                        CoreError::Internal(format!("Stored geometry of row {}: {e}", candidate.id))
                    })?;
                    match territory.clip(&parsed) {
                        Some(clipped) => (Branch::Public, Some(geometry_to_geojson(&clipped))),
                        None => (Branch::Locked, Some(value)),
                    }
                }
                (geometry, _) => (Branch::Public, geometry),
            },
        };

        resolved.push((
            branch,
            candidate.id,
            OverlayEntry {
                item: candidate.item,
                geometry,
                is_scenario_object: branch == Branch::Private,
                is_locked: branch == Branch::Locked,
            },
        ));
    }

    resolved.sort_by_key(|(branch, id, _)| (*branch, *id));
    Ok(resolved.into_iter().map(|(_, _, entry)| entry).collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
