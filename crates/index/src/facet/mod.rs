//! Facet index family
//!
//! ```text
//! FacetIndex
//!   └─ entity type ─> FacetEntityTypeIndex
//!        ├─ not grouped facets ─> FacetGroupIndex (group_id = None)
//!        ├─ group id ─────────> FacetGroupIndex
//!        │                        └─ facet id ─> FacetIdIndex (entity bitmap)
//!        └─ facet id ─> sorted group ids (reverse lookup)
//! ```
//!
//! Removal prunes bottom-up: an empty facet id index leaves its group, an
//! empty group leaves its entity type index, an empty entity type index
//! leaves the facet index.

mod entity_type_index;
mod group_index;
mod id_index;
mod index;

pub use entity_type_index::FacetEntityTypeIndex;
pub use group_index::FacetGroupIndex;
pub use id_index::FacetIdIndex;
pub use index::FacetIndex;
