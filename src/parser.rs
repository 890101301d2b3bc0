//! CSV reader for the static GTFS files of an unpacked feed directory.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::models::Feed;

pub const AGENCY_FILE: &str = "agency.txt";
pub const STOPS_FILE: &str = "stops.txt";
pub const ROUTES_FILE: &str = "routes.txt";
pub const TRIPS_FILE: &str = "trips.txt";
pub const STOP_TIMES_FILE: &str = "stop_times.txt";
pub const CALENDAR_FILE: &str = "calendar.txt";

/// Deserializes every row of a headered CSV file into `T`.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be opened, or naming the
/// file and row if a row does not match `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| format!("reading {}", path.display()))?;
        rows.push(record);
    }

    debug!(path = %path.display(), rows = rows.len(), "Read GTFS file");
    Ok(rows)
}

/// Loads the tables the classifier needs from an unpacked GTFS directory.
///
/// # Errors
///
/// Fails if any file is missing or malformed, or if `agency.txt` has no rows.
#[tracing::instrument(skip(dir), fields(dir = %dir.display()))]
pub fn load_feed(dir: &Path) -> Result<Feed> {
    let feed = Feed {
        agencies: read_records(&dir.join(AGENCY_FILE))?,
        stops: read_records(&dir.join(STOPS_FILE))?,
        routes: read_records(&dir.join(ROUTES_FILE))?,
        trips: read_records(&dir.join(TRIPS_FILE))?,
        stop_times: read_records(&dir.join(STOP_TIMES_FILE))?,
        calendars: read_records(&dir.join(CALENDAR_FILE))?,
    };

    if feed.agencies.is_empty() {
        anyhow::bail!("{} has no rows", dir.join(AGENCY_FILE).display());
    }
    if feed.agencies.len() > 1 {
        warn!(
            agencies = feed.agencies.len(),
            agency_id = %feed.agencies[0].agency_id,
            "Feed has several agencies, using the first for route merging"
        );
    }

    info!(
        stops = feed.stops.len(),
        routes = feed.routes.len(),
        trips = feed.trips.len(),
        stop_times = feed.stop_times.len(),
        calendars = feed.calendars.len(),
        "Feed loaded"
    );

    Ok(feed)
}
