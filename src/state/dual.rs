//! The current/best state pair of one search chain.

use thiserror::Error;

/// Error returned when releasing a chain that never recorded a best state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no best state has been recorded")]
pub struct NoBestError;

/// Mutable memory of one search chain: the configuration the chain is at,
/// and the best configuration seen so far.
///
/// `current` is empty only before the chain is seeded. `best`, once set, is
/// replaced only through [`DualState::assign_best_from_current`], whose
/// caller has already verified strict improvement; on an energy tie the
/// incumbent best is kept.
#[derive(Debug, Clone)]
pub struct DualState<T> {
    current: Option<T>,
    best: Option<T>,
}

impl<T> DualState<T> {
    pub fn new() -> Self {
        Self {
            current: None,
            best: None,
        }
    }

    /// Unconditionally replaces the current state, returning the displaced
    /// one.
    pub fn assign_current(&mut self, state: T) -> Option<T> {
        self.current.replace(state)
    }

    /// Copies the current state into best, unconditionally.
    pub fn assign_best_from_current(&mut self)
    where
        T: Clone,
    {
        self.best = self.current.clone();
    }

    pub fn clear_best(&mut self) {
        self.best = None;
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn best(&self) -> Option<&T> {
        self.best.as_ref()
    }

    /// Returns the best state and clears the pair, ending the chain.
    pub fn release_keep_best(&mut self) -> Result<T, NoBestError> {
        self.current = None;
        self.best.take().ok_or(NoBestError)
    }
}

impl<T> Default for DualState<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let dual: DualState<u32> = DualState::new();
        assert!(dual.current().is_none());
        assert!(dual.best().is_none());
    }

    #[test]
    fn test_assign_current_returns_displaced() {
        let mut dual = DualState::new();
        assert_eq!(dual.assign_current(1), None);
        assert_eq!(dual.assign_current(2), Some(1));
        assert_eq!(dual.current(), Some(&2));
    }

    #[test]
    fn test_assign_best_from_current() {
        let mut dual = DualState::new();
        dual.assign_current(5);
        dual.assign_best_from_current();
        assert_eq!(dual.best(), Some(&5));

        dual.assign_current(7);
        assert_eq!(dual.best(), Some(&5));
    }

    #[test]
    fn test_clear_best() {
        let mut dual = DualState::new();
        dual.assign_current(5);
        dual.assign_best_from_current();
        dual.clear_best();
        assert!(dual.best().is_none());
    }

    #[test]
    fn test_release_keep_best() {
        let mut dual = DualState::new();
        dual.assign_current(5);
        dual.assign_best_from_current();
        dual.assign_current(9);

        assert_eq!(dual.release_keep_best(), Ok(5));
        assert!(dual.current().is_none());
        assert!(dual.best().is_none());
    }

    #[test]
    fn test_release_without_best_fails() {
        let mut dual = DualState::new();
        dual.assign_current(5);
        assert_eq!(dual.release_keep_best(), Err(NoBestError));
    }
}
