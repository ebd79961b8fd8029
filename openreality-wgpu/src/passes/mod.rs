//! Render pass implementations.

pub mod taa;
