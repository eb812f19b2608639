//! Static types of expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

use qcirc_lang::ast::TypeName;

/// The type of an expression or binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Int,
    Float,
    Bool,
    Str,
    Qubit,
    Bit,
    QubitArray,
    BitArray,
    IntArray,
    FloatArray,
    BoolArray,
    /// No value: the result of a quantum operation or a procedure.
    Void,
}

impl Type {
    /// Element type of an array type.
    pub fn element(self) -> Option<Type> {
        match self {
            Type::QubitArray => Some(Type::Qubit),
            Type::BitArray => Some(Type::Bit),
            Type::IntArray => Some(Type::Int),
            Type::FloatArray => Some(Type::Float),
            Type::BoolArray => Some(Type::Bool),
            _ => None,
        }
    }

    /// Array type whose elements are `self`.
    pub fn array_of(self) -> Option<Type> {
        match self {
            Type::Qubit => Some(Type::QubitArray),
            Type::Bit => Some(Type::BitArray),
            Type::Int => Some(Type::IntArray),
            Type::Float => Some(Type::FloatArray),
            Type::Bool => Some(Type::BoolArray),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    pub fn is_array(self) -> bool {
        self.element().is_some()
    }

    /// Qubits and bits, which only appear as operands.
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            Type::Qubit | Type::Bit | Type::QubitArray | Type::BitArray
        )
    }

    /// Whether a value of type `found` may be stored where `self` is expected.
    /// `int` widens to `float`.
    pub fn accepts(self, found: Type) -> bool {
        self == found
            || matches!(
                (self, found),
                (Type::Float, Type::Int) | (Type::FloatArray, Type::IntArray)
            )
    }
}

impl From<TypeName> for Type {
    fn from(name: TypeName) -> Self {
        match name {
            TypeName::Int => Type::Int,
            TypeName::Float => Type::Float,
            TypeName::Bool => Type::Bool,
            TypeName::Str => Type::Str,
            TypeName::Qubit => Type::Qubit,
            TypeName::Bit => Type::Bit,
            TypeName::QubitArray => Type::QubitArray,
            TypeName::BitArray => Type::BitArray,
            TypeName::IntArray => Type::IntArray,
            TypeName::FloatArray => Type::FloatArray,
            TypeName::BoolArray => Type::BoolArray,
        }
    }
}

impl Type {
    /// The declared form of this type, if it can be written in source.
    pub fn type_name(self) -> Option<TypeName> {
        let name = match self {
            Type::Int => TypeName::Int,
            Type::Float => TypeName::Float,
            Type::Bool => TypeName::Bool,
            Type::Str => TypeName::Str,
            Type::Qubit => TypeName::Qubit,
            Type::Bit => TypeName::Bit,
            Type::QubitArray => TypeName::QubitArray,
            Type::BitArray => TypeName::BitArray,
            Type::IntArray => TypeName::IntArray,
            Type::FloatArray => TypeName::FloatArray,
            Type::BoolArray => TypeName::BoolArray,
            Type::Void => return None,
        };
        Some(name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Bool => "bool",
            Type::Str => "str",
            Type::Qubit => "qubit",
            Type::Bit => "bit",
            Type::QubitArray => "qubit[]",
            Type::BitArray => "bit[]",
            Type::IntArray => "int[]",
            Type::FloatArray => "float[]",
            Type::BoolArray => "bool[]",
            Type::Void => "void",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_widens_to_float() {
        assert!(Type::Float.accepts(Type::Int));
        assert!(!Type::Int.accepts(Type::Float));
        assert!(Type::FloatArray.accepts(Type::IntArray));
        assert!(!Type::Bool.accepts(Type::Int));
    }

    #[test]
    fn test_elements() {
        assert_eq!(Type::QubitArray.element(), Some(Type::Qubit));
        assert_eq!(Type::Int.array_of(), Some(Type::IntArray));
        assert!(Type::BitArray.is_operand());
        assert!(!Type::Str.is_array());
        assert_eq!(Type::Float.type_name().map(Type::from), Some(Type::Float));
        assert_eq!(Type::Void.type_name(), None);
    }
}
