//! Rush-hour frequency and weekend service checks for the routes serving a stop.
//!
//! A "major bus route" at a stop offers weekend service and, on the reference
//! weekday, arrives every 15 minutes or better during both the morning and the
//! evening peak hour. Only Monday is sampled, 08:00-09:00 and 17:00-18:00.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::Weekday;
use tracing::trace;

use crate::analyzers::types::MergedRoute;
use crate::error::ClassifyError;
use crate::models::{ArrivalTime, Calendar, RouteType, StopTime, Trip};

/// The weekday whose schedule is checked for peak-hour headways.
pub const REFERENCE_WEEKDAY: Weekday = Weekday::Mon;

/// Longest allowed gap between consecutive peak-hour arrivals.
pub const MAX_HEADWAY_SECS: u32 = 15 * 60;

/// Route groups a stop needs to qualify on bus service alone.
pub const MIN_MAJOR_BUS_ROUTES: usize = 2;

pub const MORNING_PEAK: PeakWindow = PeakWindow {
    start: ArrivalTime::from_hms(8, 0, 0),
    end: ArrivalTime::from_hms(9, 0, 0),
};

pub const EVENING_PEAK: PeakWindow = PeakWindow {
    start: ArrivalTime::from_hms(17, 0, 0),
    end: ArrivalTime::from_hms(18, 0, 0),
};

/// A half-open clock window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    pub start: ArrivalTime,
    pub end: ArrivalTime,
}

impl PeakWindow {
    pub fn contains(&self, time: ArrivalTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// Read-only lookups the analyzer resolves each visit through.
pub trait ScheduleLookup {
    fn trip(&self, trip_id: &str) -> Option<&Trip>;

    /// The index and contents of the route group `route_id` belongs to.
    fn route_group(&self, route_id: &str) -> Option<(usize, &MergedRoute)>;

    fn calendar(&self, service_id: &str) -> Option<&Calendar>;
}

/// Outcome of analyzing one merged stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A ferry, rail or other non-bus route serves the stop.
    NonBusService {
        route_id: String,
        route_type: RouteType,
    },
    /// Enough bus route groups meet the frequency and weekend criteria.
    FrequentBusRoutes { route_groups: usize },
    /// Fewer than [`MIN_MAJOR_BUS_ROUTES`] groups meet the criteria.
    NotMajor { route_groups: usize },
}

impl Verdict {
    pub fn is_major(&self) -> bool {
        !matches!(self, Verdict::NotMajor { .. })
    }
}

/// Returns true when no two consecutive times (after sorting) are more than
/// [`MAX_HEADWAY_SECS`] apart.
///
/// The times are expected to fall within one clock hour; only their minutes
/// and seconds are compared.
pub fn are_times_close<I>(times: I) -> bool
where
    I: IntoIterator<Item = ArrivalTime>,
{
    let mut times: Vec<ArrivalTime> = times.into_iter().collect();
    times.sort_unstable();

    times.windows(2).all(|pair| {
        let earlier = i64::from(pair[0].seconds_within_hour());
        let later = i64::from(pair[1].seconds_within_hour());
        later - earlier <= i64::from(MAX_HEADWAY_SECS)
    })
}

#[derive(Default)]
struct RouteGroupService {
    weekend: HashSet<usize>,
    morning: BTreeMap<usize, BTreeSet<ArrivalTime>>,
    evening: BTreeMap<usize, BTreeSet<ArrivalTime>>,
}

impl RouteGroupService {
    fn is_major_bus_route(&self, group: usize) -> bool {
        let close = |bucket: &BTreeMap<usize, BTreeSet<ArrivalTime>>| {
            are_times_close(bucket.get(&group).into_iter().flatten().copied())
        };
        self.weekend.contains(&group) && close(&self.morning) && close(&self.evening)
    }

    /// Groups are counted from the morning bucket's keys, so a group with no
    /// morning arrivals never counts even with a close evening bucket.
    fn major_bus_routes(&self) -> usize {
        self.morning
            .keys()
            .filter(|&&group| self.is_major_bus_route(group))
            .count()
    }
}

/// Decides whether the scheduled `visits` to one merged stop make it a major
/// transit stop.
///
/// The first visit by a non-bus route ends the analysis with
/// [`Verdict::NonBusService`]. Otherwise every bus visit contributes to its
/// route group's weekend flag and peak-hour buckets.
pub fn analyze_visits<'v, L, I>(lookup: &L, visits: I) -> Result<Verdict, ClassifyError>
where
    L: ScheduleLookup,
    I: IntoIterator<Item = &'v StopTime>,
{
    let mut service = RouteGroupService::default();

    for visit in visits {
        let trip = lookup
            .trip(&visit.trip_id)
            .ok_or_else(|| ClassifyError::DanglingReference {
                entity: "trip",
                id: visit.trip_id.clone(),
                referenced_by: format!("stop_time at stop {}", visit.stop_id),
            })?;
        let (group, route) =
            lookup
                .route_group(&trip.route_id)
                .ok_or_else(|| ClassifyError::DanglingReference {
                    entity: "route",
                    id: trip.route_id.clone(),
                    referenced_by: format!("trip {}", trip.trip_id),
                })?;

        if route.route_type != RouteType::Bus {
            return Ok(Verdict::NonBusService {
                route_id: trip.route_id.clone(),
                route_type: route.route_type,
            });
        }

        let calendar =
            lookup
                .calendar(&trip.service_id)
                .ok_or_else(|| ClassifyError::DanglingReference {
                    entity: "service",
                    id: trip.service_id.clone(),
                    referenced_by: format!("trip {}", trip.trip_id),
                })?;

        if calendar.runs_on_weekend() {
            service.weekend.insert(group);
        }

        if !calendar.runs_on(REFERENCE_WEEKDAY) {
            continue;
        }
        let Some(arrival) = visit.arrival_time else {
            continue;
        };
        let bucket = if MORNING_PEAK.contains(arrival) {
            &mut service.morning
        } else if EVENING_PEAK.contains(arrival) {
            &mut service.evening
        } else {
            continue;
        };
        trace!(group, %arrival, trip_id = %trip.trip_id, "Peak-hour arrival");
        bucket.entry(group).or_default().insert(arrival);
    }

    let route_groups = service.major_bus_routes();
    if route_groups >= MIN_MAJOR_BUS_ROUTES {
        Ok(Verdict::FrequentBusRoutes { route_groups })
    } else {
        Ok(Verdict::NotMajor { route_groups })
    }
}
