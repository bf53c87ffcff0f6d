pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod gradient;
pub mod loader;
pub mod output;
pub mod query;
