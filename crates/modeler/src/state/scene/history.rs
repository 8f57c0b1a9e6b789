//! Undo/redo functionality

use super::SceneState;

impl SceneState {
    /// Undo last change
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(std::mem::replace(&mut self.scene, prev));
        self.version += 1;
        true
    }

    /// Redo last undone change
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(std::mem::replace(&mut self.scene, next));
        self.version += 1;
        true
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
