//! Claim markers
//!
//! A directory is claimed by creating `<label>.lock` inside it with
//! create-exclusive semantics. That create is the only mutual exclusion
//! between workers. Markers are never removed or rewritten, so a claimed
//! directory stays claimed whether or not its job succeeded.
//!
//! The guarantee is only as strong as the filesystem's exclusive create.
//! Local filesystems provide it. Some network filesystems do not.

mod store;

pub use store::{ClaimOutcome, ClaimStore, MARKER_PREFIX};
