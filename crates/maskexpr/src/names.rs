//! Identifier-to-bit resolution.

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::jit::Width;

/// Maps identifier names to flag bits.
///
/// Resolution happens exactly once per identifier, at plan time; the
/// resulting plan carries raw masks and is independent of any naming scheme.
pub trait BitNames {
    /// Return the bit for `name`, or `None` if the name is unknown.
    fn bit_from_name(&self, name: &str) -> Option<u64>;
}

/// Maps single capital letters to bit positions: `A` = 0x1, `B` = 0x2,
/// `C` = 0x4, and so on up to `Z`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LetterBits;

impl BitNames for LetterBits {
    fn bit_from_name(&self, name: &str) -> Option<u64> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ 'A'..='Z'), None) => Some(1u64 << (c as u32 - 'A' as u32)),
            _ => None,
        }
    }
}

/// An owned `name -> bit` table built from explicit pairs.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    map: HashMap<String, u64>,
}

impl NameTable {
    pub fn new<N: Into<String>>(pairs: impl IntoIterator<Item = (N, u64)>) -> Self {
        NameTable {
            map: pairs.into_iter().map(|(n, b)| (n.into(), b)).collect(),
        }
    }
}

impl BitNames for NameTable {
    fn bit_from_name(&self, name: &str) -> Option<u64> {
        self.map.get(name).copied()
    }
}

/// A named-enumeration-like flag type that expressions can be compiled
/// against.
///
/// Implementors declare their storage width, their name table, and how a
/// value converts to raw bits. The table is consulted at compile time only.
pub trait Flags: Copy {
    /// Storage width of the underlying integer.
    const WIDTH: Width;
    /// Every flag name paired with its bit value.
    const NAMES: &'static [(&'static str, u64)];

    /// The raw bit pattern of this value.
    fn bits(self) -> u64;
}

/// Resolver over a [`Flags`] type's name table.
pub(crate) struct FlagNames<T: Flags>(PhantomData<T>);

impl<T: Flags> FlagNames<T> {
    pub(crate) fn new() -> Self {
        FlagNames(PhantomData)
    }
}

impl<T: Flags> BitNames for FlagNames<T> {
    fn bit_from_name(&self, name: &str) -> Option<u64> {
        T::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, bit)| *bit)
    }
}
