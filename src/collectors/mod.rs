pub mod host;
pub mod prediction;
