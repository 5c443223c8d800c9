//! Entity traits: identity + continuity across state changes.

use chrono::{DateTime, Utc};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Entities that are hidden instead of removed on delete.
///
/// A soft-deleted entity is invisible to normal lookups but can be restored.
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }

    fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.set_deleted_at(Some(now));
    }

    fn restore(&mut self) {
        self.set_deleted_at(None);
    }
}
