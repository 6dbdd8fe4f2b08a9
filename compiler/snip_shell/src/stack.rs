//! Stack growth for the recursive parser and evaluator.
//!
//! Deeply nested snippets (long operator chains, nested parentheses)
//! recurse once per level. On native targets `stacker` grows the stack on
//! demand; WASM manages its own stack.

/// Grow the stack before running `f` if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    /// Remaining stack below which we grow (64KB).
    const RED_ZONE: usize = 64 * 1024;

    /// Size of each new stack segment (1MB).
    const SEGMENT: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
