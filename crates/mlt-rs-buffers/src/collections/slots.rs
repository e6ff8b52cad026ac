/// Fixed block of `Option` cells with a power-of-two length, so that any
/// slot index can be wrapped into range with a mask instead of a modulo.
pub struct Slots<P> {
    cells: Box<[Option<P>]>,
    mask: usize,
}

impl<P> Slots<P> {
    /// Allocate `capacity` empty cells. `capacity` must be a power of
    /// two.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity.is_power_of_two(),
            "slot capacity must be a power of two, got {}",
            capacity
        );
        let mut cells = Vec::with_capacity(capacity);
        cells.resize_with(capacity, || None);
        Self {
            cells: cells.into_boxed_slice(),
            mask: capacity - 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    /// Wrap an unbounded slot index into the block.
    pub fn wrap(&self, index: usize) -> usize {
        index & self.mask
    }

    pub fn is_occupied(&self, index: usize) -> bool {
        self.cells[index].is_some()
    }

    /// Empty the cell, returning its content.
    pub fn take(&mut self, index: usize) -> Option<P> {
        self.cells[index].take()
    }

    /// Fill an empty cell. Occupancy must have been checked before.
    pub fn place(&mut self, index: usize, value: P) {
        debug_assert!(self.cells[index].is_none());
        self.cells[index] = Some(value);
    }

    /// Empty every cell, dropping the contents.
    pub fn clear(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.take();
        }
    }
}

#[test]
fn test() {
    let mut slots = Slots::<u32>::new(8);
    assert_eq!(slots.capacity(), 8);
    assert_eq!(slots.wrap(8), 0);
    assert_eq!(slots.wrap(13), 5);
    assert!(!slots.is_occupied(3));
    slots.place(3, 42);
    assert!(slots.is_occupied(3));
    assert_eq!(slots.take(3), Some(42));
    assert_eq!(slots.take(3), None);
    slots.place(0, 1);
    slots.clear();
    assert!(!slots.is_occupied(0));
}
