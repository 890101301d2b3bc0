//! Finds the major transit stops of a feed.
//!
//! "Major Transit Stop" as used by California housing streamlining legislation
//! (SB 35 trailer bill language) means:
//!
//! - an existing rail transit station,
//! - a ferry terminal served by either a bus or rail transit service, or
//! - the intersection of two or more major bus routes with a service interval
//!   of 15 minutes or less during the morning and afternoon peak weekday
//!   commute periods, and offering weekend service.
//!
//! Any non-bus route counts as rail or ferry service here; only the bus rule is
//! actually evaluated.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::analyzers::frequency::{ScheduleLookup, Verdict, analyze_visits};
use crate::analyzers::route_merge::merge_routes;
use crate::analyzers::stop_merge::merge_stops;
use crate::analyzers::types::{MergedRoute, MergedStop};
use crate::analyzers::utility::index_by;
use crate::config::MergeConfig;
use crate::error::ClassifyError;
use crate::models::{Agency, Calendar, Feed, StopTime, Trip};

/// Read-only indices over one feed, built once before any stop is evaluated.
pub struct FeedIndex<'a> {
    route_groups: Vec<MergedRoute>,
    route_group_by_route_id: HashMap<String, usize>,
    stop_times_by_stop_id: HashMap<&'a str, Vec<&'a StopTime>>,
    trips_by_id: HashMap<&'a str, &'a Trip>,
    calendars_by_service_id: HashMap<&'a str, &'a Calendar>,
}

impl<'a> FeedIndex<'a> {
    /// Indexes `feed` around the given route groups.
    ///
    /// # Errors
    ///
    /// Fails on a repeated `trip_id` or `service_id`.
    pub fn build(feed: &'a Feed, route_groups: Vec<MergedRoute>) -> Result<Self, ClassifyError> {
        let route_group_by_route_id: HashMap<String, usize> = route_groups
            .iter()
            .enumerate()
            .flat_map(|(group, merged)| merged.route_ids.iter().map(move |id| (id.clone(), group)))
            .collect();

        let mut stop_times_by_stop_id: HashMap<&str, Vec<&StopTime>> = HashMap::new();
        for stop_time in &feed.stop_times {
            stop_times_by_stop_id
                .entry(stop_time.stop_id.as_str())
                .or_default()
                .push(stop_time);
        }

        let trips_by_id = index_by(
            &feed.trips,
            |trip| trip.trip_id.as_str(),
            |id| ClassifyError::DuplicateTrip(id.to_string()),
        )?;
        let calendars_by_service_id = index_by(
            &feed.calendars,
            |calendar| calendar.service_id.as_str(),
            |id| ClassifyError::DuplicateService(id.to_string()),
        )?;

        debug!(
            route_groups = route_groups.len(),
            served_stops = stop_times_by_stop_id.len(),
            trips = trips_by_id.len(),
            services = calendars_by_service_id.len(),
            "Feed indexed"
        );

        Ok(Self {
            route_groups,
            route_group_by_route_id,
            stop_times_by_stop_id,
            trips_by_id,
            calendars_by_service_id,
        })
    }

    pub fn route_groups(&self) -> &[MergedRoute] {
        &self.route_groups
    }

    /// Every scheduled visit to any of the stop's constituent stops.
    pub fn visits<'s>(&'s self, stop: &'s MergedStop) -> impl Iterator<Item = &'a StopTime> + 's {
        stop.stop_ids
            .iter()
            .filter_map(|id| self.stop_times_by_stop_id.get(id.as_str()))
            .flatten()
            .copied()
    }

    pub fn evaluate(&self, stop: &MergedStop) -> Result<Verdict, ClassifyError> {
        let verdict = analyze_visits(self, self.visits(stop))?;
        debug!(stop_name = %stop.stop_name, stop_ids = ?stop.stop_ids, ?verdict, "Stop evaluated");
        Ok(verdict)
    }
}

impl ScheduleLookup for FeedIndex<'_> {
    fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips_by_id.get(trip_id).copied()
    }

    fn route_group(&self, route_id: &str) -> Option<(usize, &MergedRoute)> {
        let group = *self.route_group_by_route_id.get(route_id)?;
        Some((group, &self.route_groups[group]))
    }

    fn calendar(&self, service_id: &str) -> Option<&Calendar> {
        self.calendars_by_service_id.get(service_id).copied()
    }
}

/// Merges the routes and stops of a feed and evaluates each merged stop.
pub struct MajorStopClassifier<'a> {
    index: FeedIndex<'a>,
    merged_stops: Vec<MergedStop>,
}

impl<'a> MajorStopClassifier<'a> {
    /// Merges routes and stops and builds the lookup indices. Nothing is
    /// evaluated until [`MajorStopClassifier::major_stops`] is iterated.
    ///
    /// The duplicate-route table is selected by the feed's first agency.
    #[tracing::instrument(skip_all, fields(stops = feed.stops.len(), stop_times = feed.stop_times.len()))]
    pub fn new(feed: &'a Feed, config: &MergeConfig) -> Result<Self, ClassifyError> {
        let fallback = Agency::default();
        let agency = feed.agency().unwrap_or(&fallback);

        let route_groups = merge_routes(agency, &feed.routes, config);
        let merged_stops = merge_stops(&feed.stops);
        let index = FeedIndex::build(feed, route_groups)?;

        info!(
            agency_id = %agency.agency_id,
            route_groups = index.route_groups().len(),
            merged_stops = merged_stops.len(),
            "Classifier ready"
        );

        Ok(Self {
            index,
            merged_stops,
        })
    }

    pub fn index(&self) -> &FeedIndex<'a> {
        &self.index
    }

    pub fn merged_stops(&self) -> &[MergedStop] {
        &self.merged_stops
    }

    /// Lazily yields the merged stops that qualify, in merged-stop order.
    ///
    /// A dangling reference is yielded as an error in place of the stop it was
    /// found at; callers that must not act on partial results should collect
    /// into a `Result<Vec<_>, _>`.
    pub fn major_stops(self) -> impl Iterator<Item = Result<MergedStop, ClassifyError>> + 'a {
        let index = self.index;
        self.merged_stops
            .into_iter()
            .filter_map(move |stop| match index.evaluate(&stop) {
                Ok(verdict) if verdict.is_major() => Some(Ok(stop)),
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            })
    }
}

/// Classifies every stop of `feed`, yielding the major transit stops.
pub fn major_transit_stops<'a>(
    feed: &'a Feed,
    config: &MergeConfig,
) -> Result<impl Iterator<Item = Result<MergedStop, ClassifyError>> + use<'a>, ClassifyError> {
    Ok(MajorStopClassifier::new(feed, config)?.major_stops())
}
