pub mod delta;
pub mod disk;
pub mod snapshot;

pub use delta::{apply_delta, MatchStrategy};
pub use disk::evaluate;
pub use snapshot::evaluate_snapshot_pair;
