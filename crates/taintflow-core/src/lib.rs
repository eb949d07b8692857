//! # Taintflow Core
//!
//! IR data model for the taintflow taint analysis:
//! - An arena of values indexed by stable [`ValueId`]s, with use edges stored
//!   as adjacency lists (no ownership cycles, trivially shareable read-only)
//! - A closed tagged variant over instruction kinds ([`InstKind`])
//! - A [`FunctionBuilder`] that produces well-formed functions by construction
//! - Structural validation ([`Function::validate`]) backing the analysis
//!   crate's `InvalidGraph` failure mode
//!
//! Any IR front end (a compiler pass, a bytecode reader, a test harness) can
//! lower its program representation into a [`Function`] and hand it to
//! `taintflow-analysis`. The analysis never mutates the graph.

pub mod builder;
pub mod ir;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::FunctionBuilder;
    pub use crate::ir::{
        BasicBlock, Callee, Function, GraphError, InstKind, Instruction, SourceLocation, ValueId,
        ValueKind,
    };
}

pub use builder::FunctionBuilder;
pub use ir::{
    BasicBlock, Callee, Function, GraphError, InstKind, Instruction, SourceLocation, ValueId,
    ValueKind,
};
