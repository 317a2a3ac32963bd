pub mod app;
pub mod config;
pub mod history;
pub mod model;
pub mod prompt;
pub mod range;
pub mod report;
pub mod stats;
