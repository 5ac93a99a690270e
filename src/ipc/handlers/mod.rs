pub mod analytics;
pub mod core;
pub mod dataset;
pub mod session;
pub mod student;
