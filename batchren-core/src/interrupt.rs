use std::sync::atomic::{AtomicBool, Ordering};

/// Tracks whether we are currently prompting the user for confirmation.
static CONFIRMATION_PROMPT_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Set once Phase 1 of a batch has started. Cleared when the batch settles.
static BATCH_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Set by signal handlers; checked before a batch is allowed to start.
static INTERRUPT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// RAII helper that marks the confirmation prompt as active while it is in scope.
pub struct ConfirmationPromptGuard;

impl ConfirmationPromptGuard {
    /// Activate the confirmation prompt state until the guard is dropped.
    pub fn activate() -> Self {
        CONFIRMATION_PROMPT_ACTIVE.store(true, Ordering::SeqCst);
        Self
    }
}

impl Drop for ConfirmationPromptGuard {
    fn drop(&mut self) {
        CONFIRMATION_PROMPT_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Returns true when the confirmation prompt is currently waiting for input.
pub fn confirmation_prompt_active() -> bool {
    CONFIRMATION_PROMPT_ACTIVE.load(Ordering::SeqCst)
}

/// RAII helper held for the whole two-phase run. A batch that has entered
/// Phase 1 must reach completion or rollback, so interrupts are deferred
/// while this guard lives.
pub struct BatchGuard;

impl BatchGuard {
    pub fn activate() -> Self {
        BATCH_ACTIVE.store(true, Ordering::SeqCst);
        Self
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        BATCH_ACTIVE.store(false, Ordering::SeqCst);
    }
}

pub fn batch_active() -> bool {
    BATCH_ACTIVE.load(Ordering::SeqCst)
}

/// Record an interrupt. Returns true if it has to wait for a running batch.
pub fn request_interrupt() -> bool {
    INTERRUPT_REQUESTED.store(true, Ordering::SeqCst);
    batch_active()
}

pub fn interrupt_requested() -> bool {
    INTERRUPT_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(test)]
pub(crate) fn clear_interrupt() {
    INTERRUPT_REQUESTED.store(false, Ordering::SeqCst);
}
