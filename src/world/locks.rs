//! Scoped entity lock acquisition.
//!
//! Entity mutation requires holding the entity's lock. These helpers keep
//! lock scope to the body of a closure and release unconditionally on exit,
//! including early returns. The pair form acquires both locks in ascending
//! [`EntityId`](crate::models::EntityId) order so that two call sites
//! locking the same pair in opposite argument order cannot deadlock.
//!
//! Both helpers resolve their handles first and return `None` without
//! taking any lock when an entity is gone; callers treat that as the
//! entity-missing branch.

use std::sync::{Mutex, MutexGuard};

use crate::models::Entity;
use crate::world::EntityHandle;

fn lock(slot: &Mutex<Entity>) -> MutexGuard<'_, Entity> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Run `f` with the entity locked. Returns `None` if the handle no longer
/// resolves.
#[allow(clippy::must_use_candidate)] // Often called for the side effect alone.
pub fn with_entity<T>(handle: &EntityHandle, f: impl FnOnce(&mut Entity) -> T) -> Option<T> {
    let slot = handle.resolve()?;
    let mut guard = lock(&slot);
    Some(f(&mut guard))
}

/// Run `f` with both entities locked, acquired in ascending id order.
/// Returns `None` if either handle no longer resolves or the handles alias
/// the same entity.
#[allow(clippy::must_use_candidate)] // Often called for the side effect alone.
pub fn with_entity_pair<T>(
    a: &EntityHandle,
    b: &EntityHandle,
    f: impl FnOnce(&mut Entity, &mut Entity) -> T,
) -> Option<T> {
    if a.id() == b.id() {
        return None;
    }

    let first = a.resolve()?;
    let second = b.resolve()?;

    if a.id() < b.id() {
        let mut first = lock(&first);
        let mut second = lock(&second);
        Some(f(&mut first, &mut second))
    } else {
        let mut second = lock(&second);
        let mut first = lock(&first);
        Some(f(&mut first, &mut second))
    }
}
