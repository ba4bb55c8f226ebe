use glam::Vec3;

use crate::api::types::{AtomId, AtomSpec};

/// Host commands the simulation understands.
/// Positions are world coordinates; the host does its own 2D→3D translation.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Grab an atom: it becomes kinematic at `position`.
    BeginDrag { atom: AtomId, position: Vec3 },
    /// Move a grabbed atom.
    UpdateDrag { atom: AtomId, position: Vec3 },
    /// Release a grabbed atom with zero velocity.
    EndDrag { atom: AtomId },
    AddBond { a: AtomId, b: AtomId },
    RemoveBond { a: AtomId, b: AtomId },
    AddAtom { spec: AtomSpec },
    RemoveAtom { atom: AtomId },
}

/// Commands queued between frames, applied at the start of the next tick.
///
/// A drag update for the atom whose update is already last in the queue
/// replaces that position instead of being appended.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    /// Queue a command (called from the wasm bridge).
    pub fn push(&mut self, event: InputEvent) {
        if let InputEvent::UpdateDrag { atom, position } = event {
            if let Some(InputEvent::UpdateDrag {
                atom: last,
                position: pending,
            }) = self.events.last_mut()
            {
                if *last == atom {
                    *pending = position;
                    return;
                }
            }
        }
        self.events.push(event);
    }

    /// Take all pending commands in arrival order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pending commands, without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending commands after coalescing.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_preserves_order() {
        let mut q = InputQueue::new();
        q.push(InputEvent::BeginDrag { atom: AtomId(1), position: Vec3::ZERO });
        q.push(InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::X });
        q.push(InputEvent::EndDrag { atom: AtomId(1) });
        assert_eq!(q.len(), 3);

        let events = q.drain();
        assert!(q.is_empty());
        assert!(matches!(events[0], InputEvent::BeginDrag { .. }));
        assert_eq!(events[2], InputEvent::EndDrag { atom: AtomId(1) });
    }

    #[test]
    fn consecutive_drag_updates_keep_latest_position() {
        let mut q = InputQueue::new();
        q.push(InputEvent::BeginDrag { atom: AtomId(1), position: Vec3::ZERO });
        for x in [0.1, 0.2, 0.3] {
            q.push(InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::new(x, 0.0, 0.0) });
        }
        assert_eq!(q.len(), 2);
        assert_eq!(
            q.iter().last(),
            Some(&InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::new(0.3, 0.0, 0.0) })
        );
    }

    #[test]
    fn drag_updates_do_not_coalesce_across_atoms_or_commands() {
        let mut q = InputQueue::new();
        q.push(InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::X });
        q.push(InputEvent::UpdateDrag { atom: AtomId(2), position: Vec3::Y });
        q.push(InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::Z });
        q.push(InputEvent::EndDrag { atom: AtomId(1) });
        q.push(InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::ONE });
        assert_eq!(q.len(), 5);

        let events = q.drain();
        assert_eq!(events[0], InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::X });
        assert_eq!(events[2], InputEvent::UpdateDrag { atom: AtomId(1), position: Vec3::Z });
    }

    #[test]
    fn iter_does_not_consume() {
        let mut q = InputQueue::default();
        q.push(InputEvent::RemoveAtom { atom: AtomId(3) });
        assert_eq!(q.iter().count(), 1);
        assert_eq!(q.len(), 1);
    }
}
