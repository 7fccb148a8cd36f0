//! Behaviour factory registry for configuration-driven graphs.
//!
//! Behaviours are registered under a type name. A factory receives the
//! node's description so it can read attributes and port widths.
//!
//! # Example
//!
//! ```
//! use cosim::actor::software::compute_fn;
//! use cosim::actor::Behavior;
//! use cosim::bits::BitVector;
//! use cosim::node::NodeDesc;
//! use cosim::registry::BehaviorRegistry;
//!
//! let mut registry = BehaviorRegistry::new();
//! registry.register("Sink", |_desc| {
//!     Ok(Behavior::Software(compute_fn(|_: &[BitVector]| Ok(vec![]))))
//! });
//!
//! let desc = NodeDesc::software(1, "sink").with_input("x", 8);
//! let behavior = registry.create("Sink", &desc).unwrap();
//! assert_eq!(behavior.label(), "software");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::actor::Behavior;
use crate::error::ElaborationError;
use crate::node::NodeDesc;
use crate::nodes::{BinaryOp, Constant, RegisterStage, ReportLog, Reporter};

/// Type alias for behaviour factory functions.
pub type BehaviorFactory =
    Arc<dyn Fn(&NodeDesc) -> Result<Behavior, ElaborationError> + Send + Sync>;

/// A registry for behaviour factories.
#[derive(Default)]
pub struct BehaviorRegistry {
    factories: HashMap<String, BehaviorFactory>,
}

impl BehaviorRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory with the given type name, replacing any previous
    /// one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&NodeDesc) -> Result<Behavior, ElaborationError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a behaviour for `desc` by type name.
    pub fn create(&self, type_name: &str, desc: &NodeDesc) -> Result<Behavior, ElaborationError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ElaborationError::UnknownBehavior {
                node: desc.id,
                type_name: type_name.to_string(),
            })?;
        factory(desc)
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a type.
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }
}

impl std::fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("registered_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn output_width(desc: &NodeDesc) -> Result<usize, ElaborationError> {
    desc.outputs
        .first()
        .map(|p| p.width)
        .ok_or_else(|| ElaborationError::InvalidAttribute {
            node: desc.id,
            attr: "outputs".to_string(),
            value: "[]".to_string(),
        })
}

fn parse_attr(desc: &NodeDesc, key: &str) -> Result<u64, ElaborationError> {
    let raw = desc.attr(key).unwrap_or_default();
    let invalid = || ElaborationError::InvalidAttribute {
        node: desc.id,
        attr: key.to_string(),
        value: raw.to_string(),
    };
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => raw.parse(),
    };
    parsed.map_err(|_| invalid())
}

/// Creates a registry with the built-in behaviours.
///
/// Includes:
/// - `Constant` - software source emitting attribute `value`
/// - `Add`, `Sub`, `And`, `Or`, `Xor` - two-input software operators
/// - `Reporter` - software sink recording into `log`
/// - `RegisterStage` - one-slot hardware register
/// - `Increment` - hardware register adding 1 on the way through
pub fn create_default_registry(log: ReportLog) -> BehaviorRegistry {
    let mut registry = BehaviorRegistry::new();

    registry.register("Constant", |desc| {
        let width = output_width(desc)?;
        let value = parse_attr(desc, "value")?;
        Ok(Behavior::software(Constant::new(width, value)))
    });

    for op in BinaryOp::ALL {
        registry.register(op.type_name(), move |_desc| Ok(Behavior::software(op)));
    }

    registry.register("Reporter", move |desc| {
        Ok(Behavior::software(Reporter::new(desc.name.clone(), log.clone())))
    });

    registry.register("RegisterStage", |_desc| Ok(Behavior::hardware(RegisterStage::new())));

    registry.register("Increment", |_desc| Ok(Behavior::hardware(RegisterStage::increment())));

    registry
}
