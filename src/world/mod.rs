//! World entity store and non-owning entity handles.
//!
//! The world owns every entity in an arena of `Arc<Mutex<Entity>>` slots
//! indexed by [`EntityId`]. Everything else — sessions, tasks, collaborators
//! — holds [`EntityHandle`]s: an id plus a weak world reference. A handle
//! re-resolves on every use and treats "not found" as a first-class branch;
//! unrelated code may destroy the entity at any time.

pub mod locks;
pub mod spatial;
pub mod spawn_points;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::warn;

use crate::models::{Entity, EntityId, EntityKind, Vec3};
use crate::services::CapabilityService;
use crate::world::spatial::SpatialService;
use crate::world::spawn_points::SpawnPointRegistry;

/// The shared entity store for one zone.
pub struct World {
    entities: RwLock<HashMap<EntityId, Arc<Mutex<Entity>>>>,
    next_id: AtomicU64,
    capability: Option<Arc<dyn CapabilityService>>,
    spatial: Option<Arc<dyn SpatialService>>,
    spawn_points: SpawnPointRegistry,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entity_count())
            .field("has_capability", &self.capability.is_some())
            .field("has_spatial", &self.spatial.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder-style construction for a [`World`].
#[derive(Default)]
pub struct WorldBuilder {
    capability: Option<Arc<dyn CapabilityService>>,
    spatial: Option<Arc<dyn SpatialService>>,
    spawn_points: SpawnPointRegistry,
}

impl WorldBuilder {
    /// Attach the zone's capability service (scan outcome + cooldown policy).
    #[must_use]
    pub fn capability(mut self, service: Arc<dyn CapabilityService>) -> Self {
        self.capability = Some(service);
        self
    }

    /// Attach the zone's spatial query service.
    #[must_use]
    pub fn spatial(mut self, service: Arc<dyn SpatialService>) -> Self {
        self.spatial = Some(service);
        self
    }

    /// Attach the zone's spawn-point registry.
    #[must_use]
    pub fn spawn_points(mut self, registry: SpawnPointRegistry) -> Self {
        self.spawn_points = registry;
        self
    }

    /// Build the world.
    #[must_use]
    pub fn build(self) -> Arc<World> {
        Arc::new(World {
            entities: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            capability: self.capability,
            spatial: self.spatial,
            spawn_points: self.spawn_points,
        })
    }
}

impl World {
    /// Start building a world.
    #[must_use]
    pub fn builder() -> WorldBuilder {
        WorldBuilder::default()
    }

    /// Spawn a new entity and return a handle to it.
    #[must_use]
    pub fn spawn(
        self: &Arc<Self>,
        kind: EntityKind,
        template: &str,
        position: Vec3,
    ) -> EntityHandle {
        let id = EntityId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entity = Arc::new(Mutex::new(Entity::new(kind, template, position)));
        match self.entities.write() {
            Ok(mut map) => {
                map.insert(id, entity);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(id, entity);
            }
        }
        EntityHandle {
            id,
            world: Arc::downgrade(self),
        }
    }

    /// Destroy an entity, removing it from the world. Handles to it resolve
    /// to nothing afterwards. Destroying an already-destroyed entity is a
    /// no-op.
    pub fn destroy(&self, id: EntityId) {
        let removed = match self.entities.write() {
            Ok(mut map) => map.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        };
        if removed.is_none() {
            warn!(entity = %id, "destroy requested for unknown entity");
        }
    }

    /// Whether an entity is currently live.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.read_map(|map| map.contains_key(&id))
    }

    /// A handle to an already-spawned entity. The handle is valid to hold
    /// even if `id` is not (or no longer) live; it will simply resolve to
    /// nothing.
    #[must_use]
    pub fn handle(self: &Arc<Self>, id: EntityId) -> EntityHandle {
        EntityHandle {
            id,
            world: Arc::downgrade(self),
        }
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.read_map(HashMap::len)
    }

    /// Number of live entities of a kind. Takes each entity's lock briefly.
    #[must_use]
    pub fn count_of(&self, kind: EntityKind) -> usize {
        let slots: Vec<Arc<Mutex<Entity>>> =
            self.read_map(|map| map.values().cloned().collect());
        slots
            .iter()
            .filter(|slot| match slot.lock() {
                Ok(entity) => entity.kind == kind,
                Err(poisoned) => poisoned.into_inner().kind == kind,
            })
            .count()
    }

    /// Handle to the lowest-id live entity of a kind, if any.
    #[must_use]
    pub fn first_of(self: &Arc<Self>, kind: EntityKind) -> Option<EntityHandle> {
        let mut entries: Vec<(EntityId, Arc<Mutex<Entity>>)> =
            self.read_map(|map| map.iter().map(|(id, slot)| (*id, Arc::clone(slot))).collect());
        entries.sort_by_key(|(id, _)| *id);
        entries
            .into_iter()
            .find(|(_, slot)| match slot.lock() {
                Ok(entity) => entity.kind == kind,
                Err(poisoned) => poisoned.into_inner().kind == kind,
            })
            .map(|(id, _)| self.handle(id))
    }

    /// The zone's capability service, when one is registered.
    #[must_use]
    pub fn capability_service(&self) -> Option<Arc<dyn CapabilityService>> {
        self.capability.clone()
    }

    /// The zone's spatial service, when one is registered.
    #[must_use]
    pub fn spatial_service(&self) -> Option<Arc<dyn SpatialService>> {
        self.spatial.clone()
    }

    /// The zone's spawn-point registry.
    #[must_use]
    pub fn spawn_points(&self) -> &SpawnPointRegistry {
        &self.spawn_points
    }

    pub(crate) fn slot(&self, id: EntityId) -> Option<Arc<Mutex<Entity>>> {
        self.read_map(|map| map.get(&id).cloned())
    }

    fn read_map<T>(&self, f: impl FnOnce(&HashMap<EntityId, Arc<Mutex<Entity>>>) -> T) -> T {
        match self.entities.read() {
            Ok(map) => f(&map),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

/// Non-owning, liveness-checkable reference to a world entity.
///
/// Cloneable and cheap; never keeps the entity (or the world) alive.
#[derive(Debug, Clone)]
pub struct EntityHandle {
    id: EntityId,
    world: Weak<World>,
}

impl EntityHandle {
    /// The referenced entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The live entity slot, or `None` if the entity (or its world) has been
    /// destroyed.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<Mutex<Entity>>> {
        self.world.upgrade().and_then(|world| world.slot(self.id))
    }

    /// The owning world, while it is still alive.
    #[must_use]
    pub fn world(&self) -> Option<Arc<World>> {
        self.world.upgrade()
    }
}
