//! Alpha-vector / alpha-matrix types and the set algebra over them.

pub mod arena;
pub mod element;
pub mod feasibility;
pub mod matrix;
pub mod ops;
pub mod provenance;
pub mod select;
pub mod vector;
