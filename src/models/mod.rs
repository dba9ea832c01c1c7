pub mod evaluated;
pub mod snapshot;
