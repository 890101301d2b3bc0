//! Output persistence for major transit stops.
//!
//! One CSV row per merged stop, with the constituent stop ids encoded as a
//! JSON array of strings in the `stop_ids` column. The half-mile buffer around
//! each stop can also be written as a GeoJSON `FeatureCollection` for mapping.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::f64::consts::TAU;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::MergedStop;

/// Column order of the output file.
pub const MERGED_STOP_FIELDS: [&str; 4] = ["stop_ids", "stop_lat", "stop_lon", "stop_name"];

/// A row of the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedStopRecord {
    pub stop_ids: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub stop_name: String,
}

impl MergedStopRecord {
    pub fn from_merged_stop(stop: &MergedStop) -> Result<Self> {
        Ok(Self {
            stop_ids: serde_json::to_string(&stop.stop_ids)?,
            stop_lat: stop.stop_lat,
            stop_lon: stop.stop_lon,
            stop_name: stop.stop_name.clone(),
        })
    }

    pub fn into_merged_stop(self) -> Result<MergedStop> {
        let stop_ids: Vec<String> = serde_json::from_str(&self.stop_ids)
            .with_context(|| format!("stop_ids {:?} is not a JSON string array", self.stop_ids))?;
        Ok(MergedStop {
            stop_ids,
            stop_lat: self.stop_lat,
            stop_lon: self.stop_lon,
            stop_name: self.stop_name,
        })
    }
}

/// Writes `stops` to `path`, replacing any existing file.
///
/// The header row is written even when `stops` is empty.
pub fn write_merged_stops(path: &Path, stops: &[MergedStop]) -> Result<()> {
    debug!(path = %path.display(), stops = stops.len(), "Writing merged stops");

    let mut writer = WriterBuilder::new()
        .has_headers(false) // header is written explicitly below
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    writer.write_record(MERGED_STOP_FIELDS)?;
    for stop in stops {
        writer.serialize(MergedStopRecord::from_merged_stop(stop)?)?;
    }
    writer.flush()?;

    info!(path = %path.display(), stops = stops.len(), "Major transit stops written");
    Ok(())
}

/// Reads a file written by [`write_merged_stops`].
pub fn read_merged_stops(path: &Path) -> Result<Vec<MergedStop>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut stops = Vec::new();
    for result in reader.deserialize() {
        let record: MergedStopRecord =
            result.with_context(|| format!("reading {}", path.display()))?;
        stops.push(record.into_merged_stop()?);
    }

    Ok(stops)
}

/// Half a statute mile, the buffer drawn around each major transit stop.
pub const HALF_MILE_METERS: f64 = 804.672;
/// Number of sides of the polygon approximating the buffer circle.
pub const CIRCLE_SEGMENTS: usize = 12;
/// WGS84 semi-major axis, used as the radius of a spherical earth.
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Returns the `[lon, lat]` point `distance` meters from `(lat, lon)` along
/// `bearing` (radians clockwise from north), on a sphere.
fn destination(lat: f64, lon: f64, distance: f64, bearing: f64) -> [f64; 2] {
    let (lat1, lon1) = (lat.to_radians(), lon.to_radians());
    let angular = distance / EARTH_RADIUS_METERS;
    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());
    [lon2.to_degrees(), lat2.to_degrees()]
}

/// The half-mile buffer around `stop` as a closed GeoJSON ring of `[lon, lat]`
/// positions: [`CIRCLE_SEGMENTS`] vertices, then the first vertex repeated.
pub fn half_mile_circle(stop: &MergedStop) -> Vec<[f64; 2]> {
    let mut ring: Vec<[f64; 2]> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let bearing = TAU * i as f64 / CIRCLE_SEGMENTS as f64;
            destination(stop.stop_lat, stop.stop_lon, HALF_MILE_METERS, bearing)
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }
    ring
}

/// Builds a GeoJSON `FeatureCollection` with one `Polygon` feature per stop.
pub fn stop_buffers_geojson(stops: &[MergedStop]) -> Value {
    let features: Vec<Value> = stops
        .iter()
        .map(|stop| {
            json!({
                "type": "Feature",
                "properties": {
                    "stop_ids": stop.stop_ids,
                    "stop_name": stop.stop_name,
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [half_mile_circle(stop)],
                },
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

/// Writes the half-mile buffers of `stops` to `path` as GeoJSON, replacing any
/// existing file.
pub fn write_stop_buffers_geojson(path: &Path, stops: &[MergedStop]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &stop_buffers_geojson(stops))
        .with_context(|| format!("writing {}", path.display()))?;
    writer.flush()?;

    info!(path = %path.display(), stops = stops.len(), "Stop buffers written");
    Ok(())
}
