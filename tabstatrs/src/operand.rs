//! Filter operator registry.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandClass {
    /// `column SYMBOL value`
    Scalar,
    /// `column SYMBOL (v1, v2, ...)`
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    name: &'static str,
    symbol: &'static str,
    class: OperandClass,
}

const ENTRIES: &[Operand] = &[
    Operand::scalar("eq", "="),
    Operand::scalar("ne", "!="),
    Operand::scalar("gt", ">"),
    Operand::scalar("lt", "<"),
    Operand::scalar("ge", ">="),
    Operand::scalar("le", "<="),
    Operand::set("in", "IN"),
    Operand::set("nin", "NOT IN"),
];

static REGISTRY: Lazy<BTreeMap<&'static str, Operand>> =
    Lazy::new(|| ENTRIES.iter().map(|op| (op.name, *op)).collect());

impl Operand {
    const fn scalar(name: &'static str, symbol: &'static str) -> Self {
        Self {
            name,
            symbol,
            class: OperandClass::Scalar,
        }
    }

    const fn set(name: &'static str, symbol: &'static str) -> Self {
        Self {
            name,
            symbol,
            class: OperandClass::Set,
        }
    }

    pub fn lookup(name: &str) -> Option<&'static Operand> {
        REGISTRY.get(name)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.keys().copied()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn class(&self) -> OperandClass {
        self.class
    }

    pub fn is_set(&self) -> bool {
        self.class == OperandClass::Set
    }
}
