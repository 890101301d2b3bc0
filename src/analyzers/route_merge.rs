//! Collapses route variants into route groups.
//!
//! Some agencies run a base route and a limited-stop variant on the same
//! street (SFMTA's 5 and 5R, for instance). The variant tends to serve a
//! subset of the base route's stops, so for frequency purposes the two are
//! one route, and together they may meet a headway that neither meets alone.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::analyzers::types::MergedRoute;
use crate::analyzers::utility::group_by;
use crate::config::MergeConfig;
use crate::models::{Agency, Route};

#[derive(Debug, PartialEq, Eq, Hash)]
enum MergeKey<'a> {
    /// Index of a configured duplicate group.
    Group(usize),
    Route(&'a str),
}

/// Merges `routes` into route groups using the duplicate table configured for
/// `agency`. Routes whose short name is in no group stay on their own.
///
/// Groups come out in the order their first route appears in `routes`, and each
/// group's route type is copied from that first route.
pub fn merge_routes(agency: &Agency, routes: &[Route], config: &MergeConfig) -> Vec<MergedRoute> {
    let duplicate_groups = config.duplicate_groups(&agency.agency_id);

    let short_name_to_group: HashMap<&str, usize> = duplicate_groups
        .iter()
        .enumerate()
        .flat_map(|(group, names)| names.iter().map(move |name| (name.as_str(), group)))
        .collect();

    let groups = group_by(routes, |route| {
        match short_name_to_group.get(route.route_short_name.as_str()) {
            Some(&group) => MergeKey::Group(group),
            None => MergeKey::Route(route.route_id.as_str()),
        }
    });

    let merged: Vec<MergedRoute> = groups
        .into_iter()
        .map(|group| {
            let first = group[0];
            if let Some(other) = group.iter().find(|r| r.route_type != first.route_type) {
                warn!(
                    route_id = %first.route_id,
                    other_route_id = %other.route_id,
                    "Merged routes have different route types, keeping the first"
                );
            }
            MergedRoute {
                route_type: first.route_type,
                route_ids: group.iter().map(|r| r.route_id.clone()).collect(),
                route_short_names: group.iter().map(|r| r.route_short_name.clone()).collect(),
            }
        })
        .collect();

    debug!(
        agency_id = %agency.agency_id,
        configured_groups = duplicate_groups.len(),
        routes = routes.len(),
        route_groups = merged.len(),
        "Routes merged"
    );

    merged
}
