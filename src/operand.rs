/*
 * Filename: /src/operand.rs
 * Project: cheevo-core
 * Created Date: Monday, July 27th 2026, 12:00:00 pm
 * Author: valerino <xoanino@gmail.com>
 * Copyright (c) 2021 valerino
 *
 * MIT License
 *
 * Copyright (c) 2021 valerino
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of
 * this software and associated documentation files (the "Software"), to deal in
 * the Software without restriction, including without limitation the rights to
 * use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies
 * of the Software, and to permit persons to whom the Software is furnished to do
 * so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Operands: the tagged leaf values a [`crate::condition::Condition`] compares.

use crate::memref::{apply_view, read_live, MemRefHandle, MemSize, Peek, ViewResult};

/// A value produced while resolving an operand or folding a modifier
/// accumulator. Arithmetic promotes to `Float` if either side is a float,
/// mirroring the reference engine's typed-value union.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
}

impl Default for TypedValue {
    fn default() -> Self {
        TypedValue::zero()
    }
}

impl TypedValue {
    pub fn zero() -> Self {
        TypedValue::Int(0)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            TypedValue::Int(v) => v as f64,
            TypedValue::Float(v) => v,
        }
    }

    /// Truncates towards zero, wrapping to 32 bits the way the rest of the
    /// engine treats memory-sized integers.
    pub fn as_u32(self) -> u32 {
        match self {
            TypedValue::Int(v) => v as u32,
            TypedValue::Float(v) => v as i64 as u32,
        }
    }

    pub fn is_nonzero(self) -> bool {
        match self {
            TypedValue::Int(v) => v != 0,
            TypedValue::Float(v) => v != 0.0,
        }
    }

    pub fn add(self, other: Self) -> Self {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => TypedValue::Int(a.wrapping_add(b)),
            (a, b) => TypedValue::Float(a.as_f64() + b.as_f64()),
        }
    }

    pub fn sub(self, other: Self) -> Self {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => TypedValue::Int(a.wrapping_sub(b)),
            (a, b) => TypedValue::Float(a.as_f64() - b.as_f64()),
        }
    }

    fn from_view(v: ViewResult) -> Self {
        match v {
            ViewResult::Int(i) => TypedValue::Int(i as i64),
            ViewResult::Float(f) => TypedValue::Float(f),
        }
    }
}

/// A tagged sum of the ways an operand can resolve to a [`TypedValue`].
#[derive(Debug, Clone)]
pub enum Operand {
    Address(MemRefHandle, MemSize),
    Delta(MemRefHandle, MemSize),
    Prior(MemRefHandle, MemSize),
    BcdDecoded(Box<Operand>),
    Inverted(Box<Operand>),
    ConstInt(u32),
    ConstFloat(f64),
    Recall,
}

impl Operand {
    /// The declared address of the innermost memref, if this operand (or a
    /// `BcdDecoded`/`Inverted` wrapping one) reads memory. `AddAddress`
    /// offsetting only ever applies to this address.
    pub fn base_address(&self) -> Option<u32> {
        match self {
            Operand::Address(m, _) | Operand::Delta(m, _) | Operand::Prior(m, _) => {
                Some(m.borrow().address)
            }
            Operand::BcdDecoded(inner) | Operand::Inverted(inner) => inner.base_address(),
            Operand::ConstInt(_) | Operand::ConstFloat(_) | Operand::Recall => None,
        }
    }

    /// The bitmask this operand's resolved value occupies, used to constrain
    /// `Inverted`'s bitwise-NOT to the wrapped operand's declared view width
    /// rather than a bare 32-bit int. Operands with no declared memory view
    /// (consts, `Recall`) fall back to the full 32-bit mask.
    fn view_mask(&self) -> u32 {
        match self {
            Operand::Address(_, size) | Operand::Delta(_, size) | Operand::Prior(_, size) => {
                size.value_mask()
            }
            Operand::BcdDecoded(inner) | Operand::Inverted(inner) => inner.view_mask(),
            Operand::ConstInt(_) | Operand::ConstFloat(_) | Operand::Recall => 0xFFFF_FFFF,
        }
    }

    /// Resolves this operand to a value. `add_address`, if present, is an
    /// offset applied to the innermost memref's declared address and forces
    /// a live (non-interned) re-read at the effective address. `recall` is
    /// the value captured by the most recent `Remember` in this condset
    /// pass.
    pub fn resolve<P: Peek + ?Sized>(
        &self,
        add_address: Option<i64>,
        peek: &mut P,
        recall: TypedValue,
    ) -> TypedValue {
        match self {
            Operand::Address(mref, size) => read_sized(mref, *size, add_address, peek, false),
            Operand::Delta(mref, size) => read_sized(mref, *size, add_address, peek, true),
            Operand::Prior(mref, size) => {
                let width = size.shared_size();
                let raw = if let Some(off) = add_address {
                    let addr = (mref.borrow().address as i64).wrapping_add(off) as u32;
                    read_live(peek, addr, width)
                } else {
                    mref.borrow().prior
                };
                TypedValue::from_view(apply_view(raw, *size))
            }
            Operand::BcdDecoded(inner) => {
                let v = inner.resolve(add_address, peek, recall);
                TypedValue::Int(bcd_decode(v.as_u32()) as i64)
            }
            Operand::Inverted(inner) => {
                let v = inner.resolve(add_address, peek, recall);
                let width_mask = inner.view_mask();
                TypedValue::Int((!v.as_u32() & width_mask) as i64)
            }
            Operand::ConstInt(n) => TypedValue::Int(*n as i64),
            Operand::ConstFloat(f) => TypedValue::Float(*f),
            Operand::Recall => recall,
        }
    }
}

fn read_sized<P: Peek + ?Sized>(
    mref: &MemRefHandle,
    size: MemSize,
    add_address: Option<i64>,
    peek: &mut P,
    delta: bool,
) -> TypedValue {
    let width = size.shared_size();
    let raw = if let Some(off) = add_address {
        let addr = (mref.borrow().address as i64).wrapping_add(off) as u32;
        read_live(peek, addr, width)
    } else if delta {
        mref.borrow().previous
    } else {
        mref.borrow().value
    };
    TypedValue::from_view(apply_view(raw, size))
}

/// Decodes each nibble of `raw` as an independent base-10 digit: e.g.
/// `0x12` (BCD for "12") decodes to the integer `12`, not `18`.
fn bcd_decode(raw: u32) -> u32 {
    let mut result = 0u32;
    let mut multiplier = 1u32;
    let mut v = raw;
    while v != 0 {
        let nibble = v & 0xF;
        result += nibble * multiplier;
        multiplier *= 10;
        v >>= 4;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memref::MemRefPool;

    #[test]
    fn bcd_decodes_nibbles_as_decimal_digits() {
        assert_eq!(bcd_decode(0x12), 12);
        assert_eq!(bcd_decode(0x99), 99);
    }

    #[test]
    fn const_operands_resolve_to_themselves() {
        let mut peek = |_: u32, _: u8| 0u32;
        assert_eq!(
            Operand::ConstInt(42).resolve(None, &mut peek, TypedValue::zero()),
            TypedValue::Int(42)
        );
        assert_eq!(
            Operand::ConstFloat(1.5).resolve(None, &mut peek, TypedValue::zero()),
            TypedValue::Float(1.5)
        );
    }

    #[test]
    fn add_address_forces_a_live_read() {
        let mut pool = MemRefPool::new();
        let mref = pool.intern(0x00, 1);
        let op = Operand::Address(mref, MemSize::U8);

        let ram = [0x00u8, 0x99, 0x00, 0x00, 0x00];
        let mut peek = |addr: u32, _: u8| ram[addr as usize] as u32;
        let v = op.resolve(Some(1), &mut peek, TypedValue::zero());
        assert_eq!(v, TypedValue::Int(0x99));
    }

    #[test]
    fn inverted_masks_to_32_bits() {
        let op = Operand::Inverted(Box::new(Operand::ConstInt(0)));
        let mut peek = |_: u32, _: u8| 0u32;
        assert_eq!(
            op.resolve(None, &mut peek, TypedValue::zero()),
            TypedValue::Int(0xFFFF_FFFFu32 as i64)
        );
    }

    #[test]
    fn inverted_masks_to_the_wrapped_operand_declared_width() {
        let ram = [0x00u8, 0x12, 0x34, 0xAB, 0x56];
        let mut peek = |addr: u32, _: u8| ram[addr as usize] as u32;
        let mut pool = MemRefPool::new();

        let byte = pool.intern(0x04, 1);
        pool.refresh(&mut peek);
        let op = Operand::Inverted(Box::new(Operand::Address(byte, MemSize::U8)));
        assert_eq!(op.resolve(None, &mut peek, TypedValue::zero()), TypedValue::Int(0xA9));

        let nibble = pool.intern(0x04, 1);
        let op = Operand::Inverted(Box::new(Operand::Address(nibble, MemSize::HighNibble)));
        assert_eq!(op.resolve(None, &mut peek, TypedValue::zero()), TypedValue::Int(0xA));

        let bit = pool.intern(0x03, 1);
        let op = Operand::Inverted(Box::new(Operand::Address(bit, MemSize::Bit0)));
        assert_eq!(op.resolve(None, &mut peek, TypedValue::zero()), TypedValue::Int(0x0));
    }
}
