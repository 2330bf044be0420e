//! Python bindings for RaptorAlloc.

pub mod bindings;
pub mod numpy_bridge;
