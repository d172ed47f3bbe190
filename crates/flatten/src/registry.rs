//! Registry mapping call signatures to composite kinds.

use std::collections::HashMap;

use tracing::debug;

use crate::utils::normalize;

/// Every call kind the flattener knows how to unwrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Proxy,
    ProxyAnnounced,
    AsMulti,
    AsMultiThreshold1,
    Batch,
    BatchAll,
    ForceBatch,
    AsDerivative,
    DispatchAs,
}

impl CompositeKind {
    pub const ALL: [CompositeKind; 9] = [
        Self::Proxy,
        Self::ProxyAnnounced,
        Self::AsMulti,
        Self::AsMultiThreshold1,
        Self::Batch,
        Self::BatchAll,
        Self::ForceBatch,
        Self::AsDerivative,
        Self::DispatchAs,
    ];

    /// Canonical "module", "method" pair for this kind.
    pub fn default_signature(self) -> (&'static str, &'static str) {
        match self {
            Self::Proxy => ("proxy", "proxy"),
            Self::ProxyAnnounced => ("proxy", "proxyAnnounced"),
            Self::AsMulti => ("multisig", "asMulti"),
            Self::AsMultiThreshold1 => ("multisig", "asMultiThreshold1"),
            Self::Batch => ("utility", "batch"),
            Self::BatchAll => ("utility", "batchAll"),
            Self::ForceBatch => ("utility", "forceBatch"),
            Self::AsDerivative => ("utility", "asDerivative"),
            Self::DispatchAs => ("utility", "dispatchAs"),
        }
    }

    pub fn is_batch(self) -> bool {
        matches!(self, Self::Batch | Self::BatchAll | Self::ForceBatch)
    }
}

/// Resolution result: unwrap with an extractor, or keep as a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Composite(CompositeKind),
    Leaf,
}

/// Registry of composite call signatures.
///
/// Lookups ignore case and underscores, so `Utility.batch_all` and
/// `utility.batchAll` resolve to the same kind. Runtimes that rename a
/// call can register an alias with [`ExtractorRegistry::register`].
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    kinds: HashMap<String, CompositeKind>,
}

impl ExtractorRegistry {
    /// Create an empty registry (every call is a leaf).
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Create a registry with the default signature of every kind.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in CompositeKind::ALL {
            let (module, method) = kind.default_signature();
            registry.register(module, method, kind);
        }
        registry
    }

    /// Register (or override) the kind for a signature.
    pub fn register(&mut self, module: &str, method: &str, kind: CompositeKind) {
        let key = key(module, method);
        debug!(signature = %key, ?kind, "Registering composite call");
        self.kinds.insert(key, kind);
    }

    pub fn resolve(&self, module: &str, method: &str) -> CallKind {
        self.kinds
            .get(&key(module, method))
            .map_or(CallKind::Leaf, |kind| CallKind::Composite(*kind))
    }

    /// List all registered (normalized) signatures.
    pub fn registered_signatures(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.kinds.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn key(module: &str, method: &str) -> String {
    format!("{}.{}", normalize(module), normalize(method))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_kind() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.len(), CompositeKind::ALL.len());
        for kind in CompositeKind::ALL {
            let (module, method) = kind.default_signature();
            assert_eq!(registry.resolve(module, method), CallKind::Composite(kind));
        }
    }

    // Test critique: les noms issus de subxt (snake_case) et de polkadot.js (camelCase) se valent
    #[test]
    fn test_resolve_ignores_naming_convention() {
        let registry = ExtractorRegistry::default();
        assert_eq!(
            registry.resolve("Utility", "batch_all"),
            CallKind::Composite(CompositeKind::BatchAll)
        );
        assert_eq!(
            registry.resolve("Multisig", "as_multi_threshold_1"),
            CallKind::Composite(CompositeKind::AsMultiThreshold1)
        );
        assert_eq!(
            registry.resolve("Proxy", "proxy_announced"),
            CallKind::Composite(CompositeKind::ProxyAnnounced)
        );
    }

    #[test]
    fn test_unknown_signatures_are_leaves() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.resolve("sudo", "sudo"), CallKind::Leaf);
        assert_eq!(ExtractorRegistry::new().resolve("utility", "batch"), CallKind::Leaf);
    }

    #[test]
    fn test_register_alias() {
        let mut registry = ExtractorRegistry::default();
        assert_eq!(registry.resolve("utility", "batch_v2"), CallKind::Leaf);
        registry.register("utility", "batch_v2", CompositeKind::Batch);
        assert_eq!(
            registry.resolve("Utility", "batchV2"),
            CallKind::Composite(CompositeKind::Batch)
        );
        assert!(registry.registered_signatures().contains(&"utility.batchv2"));
    }
}
