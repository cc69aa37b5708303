//! Glyphcast Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod entities;
pub mod enums;

pub use entities::*;
pub use enums::*;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Entity identifier. The service issues UUIDv4 ids for agents, prompts,
/// proposals and chat messages alike.
pub type EntityId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new random EntityId.
pub fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}
