use mlt_rs_core::traits::packet::seq::{SequenceNumber, SequencedPacket};
use mlt_rs_core::traits::queue::reorder::{
    ForceDrainReport, InsertError, ReorderQueueInput, ReorderQueueOutput,
};
use mlt_rs_log::{log_debug, log_info, Logger};

use crate::collections::slots::Slots;

/// Token the ring logs under.
const TOKEN: &str = "reorder";

/// Counters accumulated over the lifetime of a ring.
#[derive(Debug, Default, Clone)]
pub struct ReorderRingMetrics {
    /// packets handed out in sequence order
    pub delivered: u64,

    /// inserts rejected below the window floor
    pub stale: u64,

    /// inserts rejected beyond the window
    pub future: u64,

    /// inserts rejected because the slot was already taken
    pub duplicate: u64,

    /// sequence numbers abandoned by forced drains
    pub holes: u64,
}

/// Circular reordering window over a range of sequence numbers.
///
/// Packets inserted out of order are stored at the slot their sequence
/// offset from the window floor selects, and handed back in order by
/// [`drain`](ReorderQueueOutput::drain). A gap in the sequence stalls
/// the drain until either the missing packet arrives or the caller
/// gives up on it with [`force_drain`](ReorderQueueOutput::force_drain).
///
/// The window floor is fixed by the first inserted packet; there is no
/// way to move it backwards short of [`reset`](ReorderRing::reset). The
/// ring is not synchronized; one instance belongs to one owner.
pub struct ReorderRing<S, P>
where
    S: SequenceNumber,
    P: SequencedPacket<S>,
{
    /// window cells; a cell is occupied iff its sequence number arrived
    /// and was not yet drained
    slots: Slots<P>,

    /// oldest not-yet-drained slot
    head: usize,

    /// occupied cells, diagnostics only
    count: usize,

    /// sequence number expected at `head`; meaningless until
    /// `initialized`
    min_seqn: S,

    /// set by the first insert
    initialized: bool,

    metrics: ReorderRingMetrics,

    log: Logger,
}

impl<S, P> ReorderRing<S, P>
where
    S: SequenceNumber,
    P: SequencedPacket<S>,
{
    /// Create a window of `capacity` slots, reporting through `log`.
    /// `capacity` must be a power of two and must exceed the deepest
    /// reordering the deployment is expected to tolerate.
    pub fn new(capacity: usize, log: Logger) -> Self {
        Self {
            slots: Slots::new(capacity),
            head: 0,
            count: 0,
            min_seqn: S::zero(),
            initialized: false,
            metrics: ReorderRingMetrics::default(),
            log,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of buffered packets.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sequence number the next in-order drain will deliver. `None`
    /// until the first insert fixes the window floor.
    pub fn next_sequence(&self) -> Option<S> {
        self.initialized.then_some(self.min_seqn)
    }

    /// Accumulated counters.
    pub fn metrics(&self) -> ReorderRingMetrics {
        self.metrics.clone()
    }

    /// Discard everything buffered and return to the uninitialized
    /// state; the next insert fixes a fresh window floor. For use after
    /// link-level discontinuities, when buffered state is known stale.
    pub fn reset(&mut self) {
        log_info!(self.log, TOKEN, "resetting reorder buffer");
        self.slots.clear();
        self.head = 0;
        self.count = 0;
        self.initialized = false;
    }

    /// Remove the packet at `head` and move the window floor just past
    /// it, so the slot after it becomes the oldest. `None` if the head
    /// slot is a hole.
    fn take_head(&mut self) -> Option<P> {
        let packet = self.slots.take(self.head)?;
        self.min_seqn = packet.sequence().wrapping_add(&S::one());
        self.head = self.slots.wrap(self.head + 1);
        self.count -= 1;
        self.metrics.delivered += 1;
        log_debug!(self.log, TOKEN, "dequeued packet {}", packet.sequence());
        Some(packet)
    }

    /// Step over the hole at `head` without touching the floor; the
    /// next dequeue rewrites it.
    fn skip_head(&mut self) {
        self.head = self.slots.wrap(self.head + 1);
    }
}

impl<S, P> ReorderQueueInput<S, P> for ReorderRing<S, P>
where
    S: SequenceNumber,
    P: SequencedPacket<S>,
{
    fn insert(&mut self, packet: P) -> Result<(), InsertError<S>> {
        let sequence = packet.sequence();

        if !self.initialized {
            self.min_seqn = sequence;
            self.initialized = true;
            log_info!(self.log, TOKEN, "initial sequence: {}", sequence);
        }

        // Fixed-width wrapping subtraction keeps the offset correct when
        // the sequence counter wraps around its width.
        let offset = sequence.offset_from(self.min_seqn);

        if offset < 0 {
            self.metrics.stale += 1;
            log_info!(
                self.log,
                TOKEN,
                "packet {} below window floor {} (offset {})",
                sequence,
                self.min_seqn,
                offset
            );
            return Err(InsertError::Stale {
                sequence,
                floor: self.min_seqn,
            });
        }

        if offset >= self.slots.capacity() as i64 {
            self.metrics.future += 1;
            log_info!(
                self.log,
                TOKEN,
                "packet {} ahead of window floor {} (offset {})",
                sequence,
                self.min_seqn,
                offset
            );
            return Err(InsertError::Future {
                sequence,
                floor: self.min_seqn,
            });
        }

        let position = self.slots.wrap(self.head + offset as usize);
        if self.slots.is_occupied(position) {
            self.metrics.duplicate += 1;
            log_info!(
                self.log,
                TOKEN,
                "duplicate packet {} for occupied slot {}",
                sequence,
                position
            );
            return Err(InsertError::Duplicate { sequence });
        }

        log_debug!(
            self.log,
            TOKEN,
            "inserting packet {} at slot {} (offset {}, floor {})",
            sequence,
            position,
            offset,
            self.min_seqn
        );
        self.slots.place(position, packet);
        self.count += 1;
        Ok(())
    }
}

impl<S, P> ReorderQueueOutput<S, P> for ReorderRing<S, P>
where
    S: SequenceNumber,
    P: SequencedPacket<S>,
{
    fn drain(&mut self, max_count: usize) -> Vec<P> {
        let mut packets = Vec::new();
        while packets.len() < max_count {
            match self.take_head() {
                Some(packet) => packets.push(packet),
                // a hole; it may still be filled, leave it alone
                None => break,
            }
        }
        packets
    }

    fn force_drain(&mut self, max_count: usize) -> ForceDrainReport<P> {
        let floor = self.min_seqn;
        let mut packets = Vec::new();
        let mut first_drained = None;
        // holes stepped over so far / committed by a later delivery
        let mut skipped = 0u64;
        let mut holes = 0u64;
        // one mark per scanned slot: '.' delivered, 'E' hole
        let mut trace = String::new();
        let mut last_delivery = 0;

        for _ in 0..self.slots.capacity() {
            if packets.len() >= max_count {
                break;
            }
            match self.take_head() {
                Some(packet) => {
                    if first_drained.is_none() {
                        first_drained = Some(packet.sequence());
                    }
                    packets.push(packet);
                    holes = skipped;
                    trace.push('.');
                    last_delivery = trace.len();
                }
                None => {
                    self.skip_head();
                    skipped += 1;
                    trace.push('E');
                }
            }
        }

        // trailing holes were never overtaken by the floor; drop them
        // from the trace and the report
        trace.truncate(last_delivery);
        self.metrics.holes += holes;

        let first: u64 = first_drained.map_or(0, Into::into);
        log_info!(
            self.log,
            TOKEN,
            "force drain from floor {}: first drained {}, {} packets, {} holes abandoned: {}",
            floor,
            first,
            packets.len(),
            holes,
            trace
        );

        ForceDrainReport { packets, holes }
    }
}
