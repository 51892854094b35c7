//! Worker identity
//!
//! A worker ID is written into every claim marker so an operator can tell
//! which worker took a directory. It is diagnostic only. Mutual exclusion
//! never depends on it, so a collision only makes the markers ambiguous.

use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of a generated worker ID in hex characters
pub const WORKER_ID_LEN: usize = 32;

/// Generate a worker ID from the host name and the current time
pub fn generate() -> String {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    // A clock before the epoch still yields an ID, just a less unique one
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    from_parts(&host, nanos)
}

fn from_parts(host: &str, nanos: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(host.as_bytes());
    hasher.update(nanos.to_string().as_bytes());

    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(WORKER_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generate();
        assert_eq!(id.len(), WORKER_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_id_depends_on_host_and_time() {
        let a = from_parts("node01", 1_700_000_000_000_000_000);
        let b = from_parts("node01", 1_700_000_000_000_000_001);
        let c = from_parts("node02", 1_700_000_000_000_000_000);

        assert_eq!(a, from_parts("node01", 1_700_000_000_000_000_000));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
