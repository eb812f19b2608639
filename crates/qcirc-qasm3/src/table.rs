//! Gate mnemonic table.

use rustc_hash::FxHashMap;
use std::sync::LazyLock;

use qcirc_ir::StandardGate;

/// The read-only table used by [`emit`](crate::emit).
pub static DEFAULT_GATE_TABLE: LazyLock<GateTable> = LazyLock::new(GateTable::standard);

/// Maps built-in gates to their OpenQASM 3 mnemonics.
///
/// A table is an immutable value: [`GateTable::with_mnemonic`] returns a new
/// table rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTable {
    mnemonics: FxHashMap<StandardGate, String>,
}

impl GateTable {
    /// The `stdgates.inc` names for every built-in gate.
    pub fn standard() -> Self {
        let mnemonics = StandardGate::ALL
            .iter()
            .map(|&gate| (gate, stdgates_name(gate).to_string()))
            .collect();
        Self { mnemonics }
    }

    /// An empty table.
    pub fn empty() -> Self {
        Self {
            mnemonics: FxHashMap::default(),
        }
    }

    /// Return a copy with `gate` mapped to `mnemonic`.
    #[must_use]
    pub fn with_mnemonic(mut self, gate: StandardGate, mnemonic: impl Into<String>) -> Self {
        self.mnemonics.insert(gate, mnemonic.into());
        self
    }

    /// Look up the mnemonic for a gate.
    pub fn mnemonic(&self, gate: StandardGate) -> Option<&str> {
        self.mnemonics.get(&gate).map(String::as_str)
    }

    /// Number of mapped gates.
    pub fn len(&self) -> usize {
        self.mnemonics.len()
    }

    /// Check if the table maps no gate.
    pub fn is_empty(&self) -> bool {
        self.mnemonics.is_empty()
    }
}

impl Default for GateTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn stdgates_name(gate: StandardGate) -> &'static str {
    match gate {
        StandardGate::I => "id",
        StandardGate::X => "x",
        StandardGate::Y => "y",
        StandardGate::Z => "z",
        StandardGate::H => "h",
        StandardGate::S => "s",
        StandardGate::Sdg => "sdg",
        StandardGate::T => "t",
        StandardGate::Tdg => "tdg",
        StandardGate::SX => "sx",
        StandardGate::SXdg => "sxdg",
        StandardGate::Rx => "rx",
        StandardGate::Ry => "ry",
        StandardGate::Rz => "rz",
        StandardGate::P => "p",
        StandardGate::U => "U",
        StandardGate::CX => "cx",
        StandardGate::CY => "cy",
        StandardGate::CZ => "cz",
        StandardGate::CH => "ch",
        StandardGate::Swap => "swap",
        StandardGate::CRx => "crx",
        StandardGate::CRy => "cry",
        StandardGate::CRz => "crz",
        StandardGate::CP => "cp",
        StandardGate::CCX => "ccx",
        StandardGate::CSwap => "cswap",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_covers_all_gates() {
        let table = GateTable::standard();
        assert_eq!(table.len(), StandardGate::ALL.len());
        assert_eq!(table.mnemonic(StandardGate::CX), Some("cx"));
        assert_eq!(table.mnemonic(StandardGate::U), Some("U"));
        assert_eq!(table.mnemonic(StandardGate::I), Some("id"));
    }

    #[test]
    fn test_with_mnemonic_leaves_original() {
        let base = GateTable::standard();
        let custom = base.clone().with_mnemonic(StandardGate::CX, "CX");
        assert_eq!(base.mnemonic(StandardGate::CX), Some("cx"));
        assert_eq!(custom.mnemonic(StandardGate::CX), Some("CX"));
    }

    #[test]
    fn test_shared_default() {
        assert_eq!(*DEFAULT_GATE_TABLE, GateTable::standard());
        assert!(GateTable::empty().is_empty());
    }
}
