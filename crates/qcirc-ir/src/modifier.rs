//! Gate modifiers and their composition law.
//!
//! A modifier list is kept in canonical form: every `ctrl(n)` entry in
//! outer-to-inner order, followed by at most one `inv`. Composing an outer
//! list onto an inner one concatenates the control entries (outer first) and
//! keeps `inv` only when the total number of inversions is odd. Control
//! entries are never merged, so `ctrl` applied to `ctrl` stays two entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `ctrl(n)` or `inv` annotation on a gate invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    /// Controlled on `n` additional qubits (`n >= 1`).
    Ctrl(u32),
    /// Inverse (dagger).
    Inv,
}

impl Modifier {
    /// Number of control qubits this modifier adds.
    #[inline]
    pub fn controls(self) -> u32 {
        match self {
            Modifier::Ctrl(n) => n,
            Modifier::Inv => 0,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Ctrl(1) => f.write_str("ctrl"),
            Modifier::Ctrl(n) => write!(f, "ctrl[{n}]"),
            Modifier::Inv => f.write_str("inv"),
        }
    }
}

/// Total number of control qubits requested by `modifiers`.
pub fn control_count(modifiers: &[Modifier]) -> usize {
    modifiers.iter().map(|m| m.controls() as usize).sum()
}

/// Whether `modifiers` invert the gate (odd number of `inv`).
pub fn is_inverted(modifiers: &[Modifier]) -> bool {
    modifiers.iter().filter(|m| matches!(m, Modifier::Inv)).count() % 2 == 1
}

/// Bring a modifier list into canonical form.
pub fn canonicalize(modifiers: &[Modifier]) -> Vec<Modifier> {
    let mut out: Vec<Modifier> = modifiers
        .iter()
        .copied()
        .filter(|m| matches!(m, Modifier::Ctrl(_)))
        .collect();
    if is_inverted(modifiers) {
        out.push(Modifier::Inv);
    }
    out
}

/// Compose `outer` onto `inner`, returning the canonical result.
pub fn compose(outer: &[Modifier], inner: &[Modifier]) -> Vec<Modifier> {
    let joined: Vec<Modifier> = outer.iter().chain(inner).copied().collect();
    canonicalize(&joined)
}

/// Check that a list is already canonical.
pub fn is_canonical(modifiers: &[Modifier]) -> bool {
    canonicalize(modifiers) == modifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_inverse_cancels() {
        assert!(compose(&[Modifier::Inv], &[Modifier::Inv]).is_empty());
    }

    #[test]
    fn test_odd_inverse_survives_once() {
        let out = compose(&[Modifier::Inv, Modifier::Inv], &[Modifier::Inv]);
        assert_eq!(out, vec![Modifier::Inv]);
    }

    #[test]
    fn test_controls_accumulate_outer_first() {
        let out = compose(&[Modifier::Ctrl(2)], &[Modifier::Ctrl(1)]);
        assert_eq!(out, vec![Modifier::Ctrl(2), Modifier::Ctrl(1)]);
        assert_eq!(control_count(&out), 3);
    }

    #[test]
    fn test_inverse_moves_after_controls() {
        let out = compose(&[Modifier::Inv], &[Modifier::Ctrl(1)]);
        assert_eq!(out, vec![Modifier::Ctrl(1), Modifier::Inv]);
        assert!(is_canonical(&out));
        assert!(!is_canonical(&[Modifier::Inv, Modifier::Ctrl(1)]));
    }
}
