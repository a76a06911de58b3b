//! RivetIR: the hierarchical intermediate representation produced by
//! module realization.
//!
//! This crate defines the [`TypeDb`] type system, the [`SignalNode`] data-flow
//! graph, module interfaces ([`ModuleInfo`], [`Port`]), realized
//! [`Instance`]s, and the [`Design`] container that holds all of them and is
//! handed to a backend after validation.

#![warn(missing_docs)]

pub mod arena;
pub mod design;
pub mod ids;
pub mod instance;
pub mod module;
pub mod port;
pub mod signal;
pub mod types;

pub use arena::{Arena, ArenaId};
pub use design::Design;
pub use ids::{InstanceId, ModuleId, SignalId, TypeId};
pub use instance::{Instance, InstanceState, OutputSlot, PortBinding};
pub use module::ModuleInfo;
pub use port::{Port, PortDirection, PortRole};
pub use signal::{OpKind, RegisterReset, ResetKind, Signal, SignalKind, SignalNode};
pub use types::{Type, TypeDb, TypeError};
