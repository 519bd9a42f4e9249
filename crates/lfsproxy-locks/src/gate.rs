//! Per-repository exclusive gates.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

/// Lazily created async mutex per store location.
///
/// Gates are never evicted, so every caller for a location always receives
/// the same mutex for the life of the registry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lfsproxy_locks::GateRegistry;
///
/// let registry = GateRegistry::new();
/// let a = registry.gate("locks/alice/game.json");
/// let b = registry.gate("locks/alice/game.json");
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct GateRegistry {
    gates: DashMap<String, Arc<Mutex<()>>>,
}

impl GateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the gate of `location`.
    #[must_use]
    pub fn gate(&self, location: &str) -> Arc<Mutex<()>> {
        if let Some(gate) = self.gates.get(location) {
            return Arc::clone(&gate);
        }
        self.gates
            .entry(location.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Number of gates created so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Returns `true` if no gate was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_one_gate_per_location() {
        let registry = GateRegistry::new();
        let a = registry.gate("a");
        let b = registry.gate("b");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &registry.gate("a")));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_should_not_block_other_locations() {
        let registry = GateRegistry::new();
        let gate_a = registry.gate("a");
        let _held = gate_a.lock().await;

        let gate_b = registry.gate("b");
        assert!(gate_b.try_lock().is_ok());
        assert!(registry.gate("a").try_lock().is_err());
    }
}
