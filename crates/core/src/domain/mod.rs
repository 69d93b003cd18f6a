pub mod holding;
pub mod report;
