//! Discovery of candidate job directories
//!
//! Each pattern is resolved against the filesystem as it is right now.
//! Nothing is cached between passes, so directories created or removed
//! while workers run are picked up (or dropped) on the next pass.

mod scanner;

pub use scanner::{Candidates, DiscoveryScanner};
