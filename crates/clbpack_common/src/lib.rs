//! Shared foundational types used across the clbpack clusterer.
//!
//! This crate provides the opaque arena IDs for blocks, nets and clusters,
//! and the epsilon comparison used by every floating-point timing calculation.

#![warn(missing_docs)]

pub mod float;
pub mod ids;

pub use float::{approx_eq, EQUAL_EPSILON};
pub use ids::{BlockId, ClusterId, NetId};
