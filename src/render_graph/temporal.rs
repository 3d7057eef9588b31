//! Multi-generation resources
//!
//! A [`TemporalResource`] keeps `N >= 2` generations of a resource in a ring.
//! The producer writes into [`write`](TemporalResource::write) and consumers
//! read completed generations through [`read`](TemporalResource::read), so a
//! slot is never sampled while it is being rendered.
//!
//! Indexing: `read(0)` is the generation completed by the most recent
//! [`advance_frame`](TemporalResource::advance_frame), `read(1)` the one
//! before it, and so on. A lag of `N - 1` aliases the write slot and is only
//! safe to read before the next write starts.

use crate::render_graph::error::{GraphError, GraphResult};

#[derive(Debug, Clone)]
pub struct TemporalResource<T> {
    slots: Vec<T>,
    write_index: usize,
    frames_since_reset: u64,
}

impl<T: Copy> TemporalResource<T> {
    pub fn new(slots: Vec<T>) -> GraphResult<Self> {
        if slots.len() < 2 {
            return Err(GraphError::InvalidHistoryLength(slots.len()));
        }
        Ok(Self {
            slots,
            write_index: 0,
            frames_since_reset: 0,
        })
    }

    /// Allocate `history_length` slots with `create`
    pub fn try_from_fn<E>(
        history_length: usize,
        mut create: impl FnMut(usize) -> Result<T, E>,
    ) -> GraphResult<Self>
    where
        GraphError: From<E>,
    {
        if history_length < 2 {
            return Err(GraphError::InvalidHistoryLength(history_length));
        }
        let slots = (0..history_length)
            .map(&mut create)
            .collect::<Result<Vec<_>, E>>()?;
        Self::new(slots)
    }

    pub fn history_length(&self) -> usize {
        self.slots.len()
    }

    /// Slot to produce into this frame
    pub fn write(&self) -> T {
        self.slots[self.write_index]
    }

    /// Generation completed `lag` advances ago; `None` if `lag` exceeds the ring
    pub fn read(&self, lag: usize) -> Option<T> {
        let n = self.slots.len();
        if lag >= n {
            return None;
        }
        let index = (self.write_index + 2 * n - 1 - lag) % n;
        Some(self.slots[index])
    }

    /// [`read`](Self::read), but only when that generation holds real data
    pub fn read_valid(&self, lag: usize) -> Option<T> {
        if self.has_valid_history(lag) {
            self.read(lag)
        } else {
            None
        }
    }

    pub fn has_valid_history(&self, lag: usize) -> bool {
        self.frames_since_reset > lag as u64
    }

    /// Commit the current write slot and move to the next one
    pub fn advance_frame(&mut self) {
        self.write_index = (self.write_index + 1) % self.slots.len();
        self.frames_since_reset += 1;
    }

    /// Forget history without releasing slots
    pub fn invalidate_history(&mut self) {
        self.frames_since_reset = 0;
    }

    /// Swap in new slots (e.g. after a resolution change) and return the old
    /// ones for deferred release. History is invalidated.
    pub fn replace_slots(&mut self, slots: Vec<T>) -> GraphResult<Vec<T>> {
        if slots.len() < 2 {
            return Err(GraphError::InvalidHistoryLength(slots.len()));
        }
        self.write_index = 0;
        self.invalidate_history();
        Ok(std::mem::replace(&mut self.slots, slots))
    }

    pub fn frames_since_reset(&self) -> u64 {
        self.frames_since_reset
    }

    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// Consume the resource, handing back every slot for release
    pub fn dispose(self) -> Vec<T> {
        self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_short_history() {
        assert_eq!(
            TemporalResource::new(vec![1u32]).unwrap_err(),
            GraphError::InvalidHistoryLength(1)
        );
    }

    #[test]
    fn test_history_validity_after_two_advances() {
        let mut ring = TemporalResource::new(vec![10u32, 20]).unwrap();
        assert!(!ring.has_valid_history(0));
        ring.advance_frame();
        assert!(ring.has_valid_history(0));
        assert!(!ring.has_valid_history(1));
        ring.advance_frame();
        assert!(ring.has_valid_history(1));
    }

    #[test]
    fn test_lagged_read_returns_older_generation() {
        let mut ring = TemporalResource::new(vec!['a', 'b', 'c']).unwrap();
        // frame 1 writes 'a', frame 2 writes 'b'
        assert_eq!(ring.write(), 'a');
        ring.advance_frame();
        assert_eq!(ring.write(), 'b');
        ring.advance_frame();
        assert_eq!(ring.read(0), Some('b'));
        assert_eq!(ring.read(1), Some('a'));
        assert_eq!(ring.read(3), None);
        assert_eq!(ring.read_valid(2), None);
    }

    #[test]
    fn test_invalidate_keeps_slots() {
        let mut ring = TemporalResource::new(vec![1u8, 2]).unwrap();
        ring.advance_frame();
        ring.advance_frame();
        ring.invalidate_history();
        assert_eq!(ring.frames_since_reset(), 0);
        assert!(!ring.has_valid_history(0));
        assert_eq!(ring.slots(), &[1, 2]);
    }

    #[test]
    fn test_replace_slots_returns_old() {
        let mut ring = TemporalResource::new(vec![1u8, 2]).unwrap();
        ring.advance_frame();
        let old = ring.replace_slots(vec![3, 4, 5]).unwrap();
        assert_eq!(old, vec![1, 2]);
        assert_eq!(ring.history_length(), 3);
        assert_eq!(ring.write(), 3);
        assert!(!ring.has_valid_history(0));
    }

    #[test]
    fn test_try_from_fn_propagates_errors() {
        use crate::backend::traits::BackendError;
        let result = TemporalResource::<u32>::try_from_fn(2, |i| {
            if i == 1 {
                Err(BackendError::ContextUnavailable)
            } else {
                Ok(i as u32)
            }
        });
        assert!(matches!(result, Err(GraphError::Backend(_))));
    }
}
