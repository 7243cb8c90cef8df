//! Concurrent structure tracker, fitness engine, and crystal-aware genetic
//! operators for evolutionary crystal-structure prediction.

pub mod core;
pub mod error;
pub mod fitness;
pub mod generate;
pub mod oracle;
pub mod operators;
pub mod persistence;
pub mod poscar;
pub mod queue;
pub mod settings;
pub mod symmetry;
