//! Setup helpers for host applications.
//!
//! Hosts call these at startup to get registries holding every built-in
//! node type and adapter. Calling into this crate also guarantees it is
//! linked, so its `inventory` registrations are visible.

use datafix_engine::{AdapterRegistry, DemandEngine, NodeRegistry, Session};

/// Registry of every node type linked into the binary
pub fn builtin_registry() -> NodeRegistry {
    let registry = NodeRegistry::with_builtins();
    log::debug!("Loaded {} node type(s)", registry.len());
    registry
}

/// Registry of every adapter linked into the binary
pub fn builtin_adapters() -> AdapterRegistry {
    let adapters = AdapterRegistry::with_builtins();
    log::debug!("Loaded {} adapter(s)", adapters.len());
    adapters
}

/// Engine with the built-in adapters installed
pub fn builtin_engine() -> DemandEngine {
    DemandEngine::new().with_adapters(builtin_adapters())
}

/// Session with the built-in adapters and node types
///
/// # Example
///
/// ```ignore
/// let mut session = datafix_nodes::builtin_session("assets");
/// session.add_from_registry("paths-in-folder", None, &json!({"folder": "assets"}))?;
/// session.add_from_registry("path-is-file", None, &Value::Null)?;
/// session.run()?;
/// ```
pub fn builtin_session(name: impl Into<String>) -> Session {
    Session::with_engine(builtin_engine(), name).with_registry(builtin_registry())
}
