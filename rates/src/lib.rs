pub mod config;
pub mod outlier;
pub mod types;
