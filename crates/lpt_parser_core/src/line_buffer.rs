use crate::MAX_LINE_LEN;

/// Accumulates the print positions of one line.
///
/// Holds at most [`MAX_LINE_LEN`] units. Units pushed beyond that are dropped
/// until the buffer is taken, so an overlong line keeps its first 132 positions.
#[derive(Debug, Clone)]
pub struct LineBuffer<T> {
    units: Vec<T>,
}

impl<T: Copy> Default for LineBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> LineBuffer<T> {
    pub fn new() -> Self {
        Self {
            units: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Appends a unit. Returns `false` if the buffer was already full and the unit was discarded.
    #[inline]
    pub fn push(&mut self, unit: T) -> bool {
        if self.is_full() {
            return false;
        }
        self.units.push(unit);
        true
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.units.len() >= MAX_LINE_LEN
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of units written since the last flush.
    #[inline]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.units
    }

    /// Hands the buffered units to `f` and resets the cursor to zero.
    pub fn flush_with<R>(&mut self, f: impl FnOnce(&[T]) -> R) -> R {
        let result = f(&self.units);
        self.units.clear();
        result
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }
}

impl LineBuffer<char> {
    /// Fills the buffer from a string, keeping the first 132 characters.
    pub fn fill_from(&mut self, text: &str) {
        self.units.clear();
        for ch in text.chars() {
            if !self.push(ch) {
                break;
            }
        }
    }

    pub fn take_string(&mut self) -> String {
        self.flush_with(|units| units.iter().collect())
    }
}
