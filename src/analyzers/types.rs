//! Derived entities produced by the merge passes.

use std::collections::BTreeSet;

use crate::models::RouteType;

/// Routes that are operational variants of one logical route (e.g. a base
/// route and its rapid service), treated as a single route group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRoute {
    /// Copied from the first route of the group in input order.
    pub route_type: RouteType,
    pub route_ids: BTreeSet<String>,
    pub route_short_names: BTreeSet<String>,
}

/// Stops naming the same intersection, collapsed into one location.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedStop {
    /// Constituent stop ids in input order.
    pub stop_ids: Vec<String>,
    pub stop_lat: f64,
    pub stop_lon: f64,
    /// Name of the first constituent stop.
    pub stop_name: String,
}
