//! The scratch arena shared by the stages of a single compilation request.

use crate::ids::{CharClassID, StateID};

/// A reusable scratch area owned exclusively by one `RequestCoordinator` for
/// the life of its request. The parser, NFA builder, and DFA builder borrow
/// it mutably in turn; none retain a reference past their own return, so no
/// locking is required.
#[derive(Debug, Default)]
pub struct CompilationBuffer {
    next_state_id: StateID,
    next_char_class_id: CharClassID,
    /// Scratch storage reused by the NFA/DFA builders for state-set work
    /// lists, avoiding a fresh allocation per subset-construction step.
    state_set_scratch: Vec<StateID>,
}

impl CompilationBuffer {
    /// Creates a fresh, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next state id and advances the counter.
    pub fn alloc_state(&mut self) -> StateID {
        let id = self.next_state_id;
        self.next_state_id = StateID::new(id.raw() + 1);
        id
    }

    /// Allocates the next character-class id and advances the counter.
    pub fn alloc_char_class(&mut self) -> CharClassID {
        let id = self.next_char_class_id;
        self.next_char_class_id = CharClassID::new(id.raw() + 1);
        id
    }

    /// Returns the scratch vector for state-set work lists, cleared for
    /// reuse by the caller.
    pub fn state_set_scratch(&mut self) -> &mut Vec<StateID> {
        self.state_set_scratch.clear();
        &mut self.state_set_scratch
    }

    /// Resets all counters and scratch storage. Not used within a single
    /// request (stages run once each) but exposed so a caller compiling many
    /// patterns back-to-back off the same buffer allocation can reuse the
    /// backing `Vec` capacity instead of allocating a fresh buffer per
    /// request.
    pub fn reset(&mut self) {
        self.next_state_id = StateID::default();
        self.next_char_class_id = CharClassID::default();
        self.state_set_scratch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_ids_are_monotonic_and_distinct() {
        let mut buffer = CompilationBuffer::new();
        let a = buffer.alloc_state();
        let b = buffer.alloc_state();
        let c = buffer.alloc_state();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(a.as_usize() + 1, b.as_usize());
        assert_eq!(b.as_usize() + 1, c.as_usize());
    }

    #[test]
    fn reset_rewinds_counters() {
        let mut buffer = CompilationBuffer::new();
        buffer.alloc_state();
        buffer.alloc_state();
        buffer.reset();
        assert_eq!(buffer.alloc_state().as_usize(), 0);
    }
}
