//! Collapses stops that name the same intersection.
//!
//! Agencies usually place one stop per direction or corner, named after the
//! cross streets in either order ("24th St & Mission St", "Mission St & 24th St").
//! Treating those as one site matches the notion of "the intersection of two
//! or more major bus routes".

use std::collections::BTreeSet;

use tracing::debug;

use crate::analyzers::types::MergedStop;
use crate::analyzers::utility::{group_by, mean};
use crate::models::Stop;

/// The set of trimmed street names in a stop name split on `&`.
pub fn cross_street_key(stop_name: &str) -> BTreeSet<&str> {
    stop_name.split('&').map(str::trim).collect()
}

/// Merges stops sharing a cross-street key. Merged stops come out in the order
/// their first member appears, and take that member's name.
pub fn merge_stops(stops: &[Stop]) -> Vec<MergedStop> {
    let merged: Vec<MergedStop> = group_by(stops, |stop| cross_street_key(&stop.stop_name))
        .into_iter()
        .map(|group| {
            let lats: Vec<f64> = group.iter().map(|s| s.stop_lat).collect();
            let lons: Vec<f64> = group.iter().map(|s| s.stop_lon).collect();
            MergedStop {
                stop_ids: group.iter().map(|s| s.stop_id.clone()).collect(),
                stop_lat: mean(&lats),
                stop_lon: mean(&lons),
                stop_name: group[0].stop_name.clone(),
            }
        })
        .collect();

    debug!(stops = stops.len(), merged_stops = merged.len(), "Stops merged");

    merged
}
