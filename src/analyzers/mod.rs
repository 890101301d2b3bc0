//! Route and stop merging, and major transit stop classification.
//!
//! Routes are merged into route groups and stops into intersections, then
//! each intersection's scheduled visits are checked for rail or ferry service,
//! or for at least two frequent bus route groups with weekend service.

pub mod classifier;
pub mod frequency;
pub mod route_merge;
pub mod stop_merge;
pub mod types;
pub mod utility;
