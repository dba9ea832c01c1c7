pub mod payload;
pub mod report;
pub mod webhook;
