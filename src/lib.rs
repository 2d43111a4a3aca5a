pub mod analyzers;
pub mod config;
pub mod duration;
pub mod error;
pub mod output;
pub mod parser;
pub mod records;
