//! One-step undo for the last edit and the last delete.
//!
//! Each slot holds a full copy of the record as it was before the action.
//! The slots live only in process memory; a restart forgets them.

use crate::models::Submission;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct UndoCache {
    edited: Mutex<Option<Submission>>,
    deleted: Mutex<Option<Submission>>,
}

impl UndoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the edit slot with the pre-edit record.
    pub fn remember_edit(&self, before: Submission) {
        *lock(&self.edited) = Some(before);
    }

    /// Replace the delete slot with the removed record.
    pub fn remember_delete(&self, removed: Submission) {
        *lock(&self.deleted) = Some(removed);
    }

    pub fn peek_edit(&self) -> Option<Submission> {
        lock(&self.edited).clone()
    }

    pub fn peek_delete(&self) -> Option<Submission> {
        lock(&self.deleted).clone()
    }

    /// Empty the edit slot, returning what it held.
    pub fn take_edit(&self) -> Option<Submission> {
        lock(&self.edited).take()
    }

    pub fn take_delete(&self) -> Option<Submission> {
        lock(&self.deleted).take()
    }
}

// A poisoned slot still holds a valid Option, so recover it.
fn lock(slot: &Mutex<Option<Submission>>) -> std::sync::MutexGuard<'_, Option<Submission>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
