//! Lap-level race analysis.
//!
//! Per-driver laps are segmented into stints, pit stops are inferred from
//! stint changes, and the results are aggregated and joined against weather,
//! position and classification tables. [`analyzer`] ties the steps together
//! into the CSV reports.

pub mod aggregate;
pub mod analyzer;
pub mod asof;
pub mod compound;
pub mod position;
pub mod race_length;
pub mod results;
pub mod segmentation;
pub mod types;
pub mod utility;
