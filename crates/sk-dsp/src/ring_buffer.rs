//! Fixed-capacity circular buffer
//!
//! Independent read and write cursors that wrap around the capacity. The
//! storage is either allocated by the buffer or borrowed from the caller;
//! borrowed memory is never released by the buffer.

use sk_core::{HiResValue, SkError, SkResult};

enum Storage<'a, T> {
    Owned(Vec<T>),
    Borrowed(&'a mut [T]),
}

impl<T> Storage<'_, T> {
    #[inline]
    fn as_slice(&self) -> &[T] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(s) => s,
        }
    }

    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        match self {
            Storage::Owned(v) => v,
            Storage::Borrowed(s) => s,
        }
    }
}

/// Circular store with separate read and write cursors
pub struct RingBuffer<'a, T> {
    storage: Storage<'a, T>,
    read_pos: usize,
    write_pos: usize,
}

impl<T: Copy + Default> RingBuffer<'static, T> {
    /// Allocate an owned buffer of `capacity` default values
    pub fn new(capacity: usize) -> SkResult<Self> {
        if capacity == 0 {
            return Err(SkError::InvalidConfig(
                "ring buffer capacity must be > 0".to_string(),
            ));
        }
        Ok(Self {
            storage: Storage::Owned(vec![T::default(); capacity]),
            read_pos: 0,
            write_pos: 0,
        })
    }
}

impl<'a, T: Copy + Default> RingBuffer<'a, T> {
    /// Use caller-owned memory as storage
    pub fn with_external(memory: &'a mut [T]) -> SkResult<Self> {
        if memory.is_empty() {
            return Err(SkError::InvalidConfig(
                "ring buffer capacity must be > 0".to_string(),
            ));
        }
        Ok(Self {
            storage: Storage::Borrowed(memory),
            read_pos: 0,
            write_pos: 0,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.as_slice().len()
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    #[inline]
    pub fn read_pos(&self) -> usize {
        self.read_pos
    }

    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    pub fn set_read_pos(&mut self, pos: usize) {
        self.read_pos = pos % self.capacity();
    }

    pub fn set_write_pos(&mut self, pos: usize) {
        self.write_pos = pos % self.capacity();
    }

    /// Wrapped index of `pos + offset`; negative offsets wrap backwards
    #[inline]
    pub fn relative_index(&self, pos: usize, offset: isize) -> usize {
        let capacity = self.capacity() as isize;
        let mut index = pos as isize + offset;
        if index < 0 {
            index += (-index / capacity + 1) * capacity;
        }
        (index % capacity) as usize
    }

    pub fn shift_read_pos(&mut self, delta: isize) {
        self.read_pos = self.relative_index(self.read_pos, delta);
    }

    pub fn shift_write_pos(&mut self, delta: isize) {
        self.write_pos = self.relative_index(self.write_pos, delta);
    }

    /// Read at the read cursor and advance it
    #[inline]
    pub fn read(&mut self) -> T {
        let value = self.storage.as_slice()[self.read_pos];
        self.read_pos = self.relative_index(self.read_pos, 1);
        value
    }

    /// Write at the write cursor and advance it
    #[inline]
    pub fn write(&mut self, value: T) {
        let pos = self.write_pos;
        self.storage.as_mut_slice()[pos] = value;
        self.write_pos = self.relative_index(pos, 1);
    }

    /// Value `offset` slots away from the read cursor, cursors untouched
    #[inline]
    pub fn peek(&self, offset: isize) -> T {
        self.storage.as_slice()[self.relative_index(self.read_pos, offset)]
    }

    /// Value at an absolute (wrapped) slot
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.storage.as_slice()[index % self.capacity()]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        let index = index % self.capacity();
        self.storage.as_mut_slice()[index] = value;
    }

    pub fn write_slice(&mut self, values: &[T]) {
        for &v in values {
            self.write(v);
        }
    }

    pub fn read_into(&mut self, out: &mut [T]) {
        for slot in out.iter_mut() {
            *slot = self.read();
        }
    }

    /// Copy `out.len()` values starting at slot `start` without moving cursors
    pub fn copy_block(&self, start: usize, out: &mut [T]) {
        let data = self.storage.as_slice();
        let capacity = data.len();
        let mut index = start % capacity;
        for slot in out.iter_mut() {
            *slot = data[index];
            index += 1;
            if index == capacity {
                index = 0;
            }
        }
    }

    /// Reset contents to default and both cursors to zero
    pub fn clear(&mut self) {
        self.storage.as_mut_slice().fill(T::default());
        self.read_pos = 0;
        self.write_pos = 0;
    }
}

impl RingBuffer<'_, f64> {
    /// Linearly interpolated read at a fractional slot position
    pub fn read_lerp(&self, pos: &HiResValue) -> f64 {
        let index = self.relative_index(0, pos.int_part() as isize);
        let next = self.relative_index(index, 1);
        let frac = pos.frac_part();
        let data = self.storage.as_slice();
        data[index] * (1.0 - frac) + data[next] * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraparound_overwrites_oldest() {
        let mut ring = RingBuffer::<i32>::new(4).unwrap();
        for v in 0..5 {
            ring.write(v);
        }

        ring.set_read_pos(0);
        let read: Vec<i32> = (0..4).map(|_| ring.read()).collect();
        assert_eq!(read, vec![4, 1, 2, 3]);
        assert_eq!(ring.write_pos(), 1);
    }

    #[test]
    fn test_relative_index_negative_offsets() {
        let ring = RingBuffer::<f32>::new(4).unwrap();
        assert_eq!(ring.relative_index(0, -1), 3);
        assert_eq!(ring.relative_index(1, -4), 1);
        assert_eq!(ring.relative_index(2, -9), 1);
        assert_eq!(ring.relative_index(3, 6), 1);
    }

    #[test]
    fn test_shift_positions_stay_in_range() {
        let mut ring = RingBuffer::<u8>::new(5).unwrap();
        ring.shift_read_pos(-12);
        assert_eq!(ring.read_pos(), 3);
        ring.shift_write_pos(13);
        assert_eq!(ring.write_pos(), 3);
        ring.shift_write_pos(-3);
        assert_eq!(ring.write_pos(), 0);
    }

    #[test]
    fn test_external_memory_is_not_owned() {
        let mut memory = [0.0f64; 3];
        {
            let mut ring = RingBuffer::with_external(&mut memory).unwrap();
            assert!(ring.is_external());
            ring.write_slice(&[1.0, 2.0, 3.0, 4.0]);
        }
        assert_eq!(memory, [4.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(RingBuffer::<f64>::new(0).is_err());
        let mut empty: [f64; 0] = [];
        assert!(RingBuffer::with_external(&mut empty).is_err());
    }

    #[test]
    fn test_copy_block_wraps() {
        let mut ring = RingBuffer::<i32>::new(4).unwrap();
        ring.write_slice(&[10, 11, 12, 13]);
        let mut out = [0; 6];
        ring.copy_block(2, &mut out);
        assert_eq!(out, [12, 13, 10, 11, 12, 13]);
        assert_eq!(ring.read_pos(), 0);
    }

    #[test]
    fn test_read_lerp() {
        let mut ring = RingBuffer::<f64>::new(4).unwrap();
        ring.write_slice(&[0.0, 1.0, 2.0, 3.0]);
        assert!((ring.read_lerp(&HiResValue::from_pos(1.5)) - 1.5).abs() < 1e-12);
        // Between the last and first slot
        assert!((ring.read_lerp(&HiResValue::from_pos(3.25)) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_peek_does_not_move() {
        let mut ring = RingBuffer::<i32>::new(3).unwrap();
        ring.write_slice(&[7, 8, 9]);
        assert_eq!(ring.peek(-1), 9);
        assert_eq!(ring.peek(1), 8);
        assert_eq!(ring.read(), 7);
    }
}
