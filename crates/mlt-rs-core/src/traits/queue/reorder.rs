use alloc::vec::Vec;
use core::fmt::{self, Display};

use crate::traits::packet::seq::{SequenceNumber, SequencedPacket};

/// Why an insert was rejected. Rejections are recoverable: the window is
/// left untouched and the packet is returned to the caller's control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError<S: SequenceNumber> {
    /// The sequence number lies below the window floor. Either a late
    /// duplicate or a packet whose sequence number the window has already
    /// given up on.
    Stale { sequence: S, floor: S },

    /// The sequence number lies too far ahead of the window floor to be
    /// buffered. The caller must drain before forward progress can
    /// continue, or the window is too small for the current reorder depth.
    Future { sequence: S, floor: S },

    /// A packet with this sequence number is already buffered. The
    /// buffered packet is kept, the new one is rejected.
    Duplicate { sequence: S },
}

impl<S: SequenceNumber> Display for InsertError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale { sequence, floor } => {
                write!(f, "packet {} below window floor {}", sequence, floor)
            }
            Self::Future { sequence, floor } => {
                write!(f, "packet {} too far ahead of window floor {}", sequence, floor)
            }
            Self::Duplicate { sequence } => {
                write!(f, "packet {} already buffered", sequence)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<S: SequenceNumber> std::error::Error for InsertError<S> {}

/// Outcome of a forced drain: the packets delivered and the number of
/// sequence numbers abandoned to get them out.
#[derive(Debug)]
pub struct ForceDrainReport<P> {
    /// Delivered packets, in sequence order.
    pub packets: Vec<P>,

    /// Holes skipped before the last delivered packet. These sequence
    /// numbers will never be delivered. Trailing holes are not counted:
    /// the window floor never passed them, so they remain deliverable.
    pub holes: u64,
}

/**
 * Write unordered packets
 */
pub trait ReorderQueueInput<S: SequenceNumber, P: SequencedPacket<S>> {
    fn insert(&mut self, packet: P) -> Result<(), InsertError<S>>;
}

/**
 * Read reordered packets
 */
pub trait ReorderQueueOutput<S: SequenceNumber, P: SequencedPacket<S>> {
    /// Remove the contiguous in-order run at the window floor, at most
    /// `max_count` packets. Stops at the first hole.
    fn drain(&mut self, max_count: usize) -> Vec<P>;

    /// Like [`drain`](Self::drain), but holes are skipped and abandoned
    /// instead of ending the run. Scans at most one full window.
    fn force_drain(&mut self, max_count: usize) -> ForceDrainReport<P>;
}
