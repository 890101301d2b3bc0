pub mod analyzers;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod parser;

pub use analyzers::classifier::{MajorStopClassifier, major_transit_stops};
pub use analyzers::types::{MergedRoute, MergedStop};
pub use config::MergeConfig;
pub use error::ClassifyError;
