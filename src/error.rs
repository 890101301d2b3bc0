//! Errors raised while indexing a feed and classifying its stops.

/// Integrity violations that abort a classification run.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClassifyError {
    /// Two rows in `trips.txt` share a `trip_id`.
    #[error("duplicate trip_id {0:?} in trips.txt")]
    DuplicateTrip(String),

    /// Two rows in `calendar.txt` share a `service_id`.
    #[error("duplicate service_id {0:?} in calendar.txt")]
    DuplicateService(String),

    /// A record points at an entity that does not exist in the feed.
    #[error("{entity} {id:?} referenced by {referenced_by} does not exist")]
    DanglingReference {
        entity: &'static str,
        id: String,
        referenced_by: String,
    },
}

/// An `arrival_time` value that is not `HH:MM:SS`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid arrival time {0:?}, expected HH:MM:SS")]
pub struct ParseArrivalTimeError(pub String);
