//! Buffers for the multi-link tunnel receive path.

/// Backing storage for circular windows
pub mod collections;

/// Buffers that reorder packets by sequence number
pub mod reorder;
