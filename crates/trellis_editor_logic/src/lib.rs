// SPDX-License-Identifier: MIT OR Apache-2.0
//! Conditional logic plugin for the Trellis editor.
//!
//! Registers the `Condition` and `Float` connection types and three node
//! kinds built on them:
//! - [`BoolSource`], a user-set boolean
//! - [`AndGate`], true when both of its inputs are true
//! - [`ExampleNode`], a float pass-through
//!
//! ```ignore
//! let types = TypeRegistry::from_providers(&[&LogicTypes])?;
//! let kinds = create_logic_registry()?;
//! ```

pub mod nodes;
pub mod types;

pub use nodes::{
    condition_of, create_logic_registry, set_bool, AndGate, BoolSource, ExampleNode, LogicNodes,
    AND_GATE, BOOL_SOURCE, EXAMPLE,
};
pub use types::{Condition, FloatValue, LogicTypes, CONDITION, FLOAT};
