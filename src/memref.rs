/*
 * Filename: /src/memref.rs
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

//! Interned memory references and the per-frame delta-tracking registry.
//!
//! A [`MemRef`] is the unit of memory access shared by every operand that
//! reads the same `(address, width)` pair. The registry batch-reads every
//! interned memref once per frame through a [`Peek`] callback and updates
//! each memref's `current` / `previous` / `prior` / `changed` fields.

use std::cell::RefCell;
use std::rc::Rc;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Declared size/view of a memory operand.
///
/// `shared_size()` collapses sub-byte views (bits, nibbles) down to the
/// enclosing byte so reads can be batched: a `Bit3` and a `LowNibble` at the
/// same address share one interned [`MemRef`], each applying its own view
/// transform when the resolved value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemSize {
    U8,
    U16LE,
    U24LE,
    U32LE,
    U16BE,
    U24BE,
    U32BE,
    LowNibble,
    HighNibble,
    Bit0,
    Bit1,
    Bit2,
    Bit3,
    Bit4,
    Bit5,
    Bit6,
    Bit7,
    BitCount,
    Float32LE,
    Float32BE,
    MBF32,
    MBF32LE,
    Double32LE,
    Double32BE,
}

impl MemSize {
    /// Number of bytes that must be peeked at `address` to resolve this view.
    pub fn shared_size(self) -> u8 {
        use MemSize::*;
        match self {
            U8 | LowNibble | HighNibble | BitCount | Bit0 | Bit1 | Bit2 | Bit3 | Bit4 | Bit5
            | Bit6 | Bit7 => 1,
            U16LE | U16BE => 2,
            U24LE | U24BE => 3,
            U32LE | U32BE | Float32LE | Float32BE | MBF32 | MBF32LE | Double32LE | Double32BE => {
                4
            }
        }
    }

    /// True for the eight single-bit selectors.
    pub fn is_bit(self) -> bool {
        matches!(
            self,
            MemSize::Bit0
                | MemSize::Bit1
                | MemSize::Bit2
                | MemSize::Bit3
                | MemSize::Bit4
                | MemSize::Bit5
                | MemSize::Bit6
                | MemSize::Bit7
        )
    }

    /// The bitmask this view's resolved value occupies, used to constrain a
    /// bitwise-NOT to the declared width rather than a bare 32-bit int.
    pub fn value_mask(self) -> u32 {
        use MemSize::*;
        match self {
            U8 | BitCount => 0xFF,
            U16LE | U16BE => 0xFFFF,
            U24LE | U24BE => 0x00FF_FFFF,
            U32LE | U32BE | Float32LE | Float32BE | MBF32 | MBF32LE | Double32LE | Double32BE => {
                0xFFFF_FFFF
            }
            LowNibble | HighNibble => 0xF,
            Bit0 | Bit1 | Bit2 | Bit3 | Bit4 | Bit5 | Bit6 | Bit7 => 0x1,
        }
    }
}

/// One logical `(address, width)` read, de-duplicated across a compiled
/// program and refreshed once per frame.
#[derive(Debug, Clone, Copy)]
pub struct MemRef {
    pub address: u32,
    pub width: u8,
    pub value: u32,
    pub previous: u32,
    pub prior: u32,
    pub changed: bool,
}

impl MemRef {
    fn new(address: u32, width: u8) -> Self {
        MemRef {
            address,
            width,
            value: 0,
            previous: 0,
            prior: 0,
            changed: false,
        }
    }
}

pub type MemRefHandle = Rc<RefCell<MemRef>>;

/// Fetches `num_bytes` (1..=4) packed little-endian starting at `address`.
///
/// Hosts that cannot service a read are expected to return 0 rather than
/// fail; the evaluator tolerates a garbage frame without erroring (see
/// the error-handling design for evaluation tolerances).
pub trait Peek {
    fn peek(&mut self, address: u32, num_bytes: u8) -> u32;
}

impl<F> Peek for F
where
    F: FnMut(u32, u8) -> u32,
{
    fn peek(&mut self, address: u32, num_bytes: u8) -> u32 {
        self(address, num_bytes)
    }
}

/// Interning table + per-frame refresh for every distinct memref referenced
/// by one or more compiled programs sharing this pool.
#[derive(Default)]
pub struct MemRefPool {
    order: Vec<MemRefHandle>,
    by_key: std::collections::HashMap<(u32, u8), MemRefHandle>,
}

impl MemRefPool {
    pub fn new() -> Self {
        MemRefPool::default()
    }

    /// Interns `(address, width)`, returning the shared handle. A second
    /// call with the same key returns the exact same `Rc`.
    pub fn intern(&mut self, address: u32, width: u8) -> MemRefHandle {
        if let Some(existing) = self.by_key.get(&(address, width)) {
            return Rc::clone(existing);
        }
        let handle = Rc::new(RefCell::new(MemRef::new(address, width)));
        self.by_key.insert((address, width), Rc::clone(&handle));
        self.order.push(Rc::clone(&handle));
        handle
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Re-reads every interned memref through `peek`, in insertion order.
    pub fn refresh<P: Peek + ?Sized>(&self, peek: &mut P) {
        for handle in &self.order {
            let mut r = handle.borrow_mut();
            let new_value = peek.peek(r.address, r.width);
            r.changed = new_value != r.value;
            if r.changed {
                r.prior = r.value;
            }
            r.previous = r.value;
            r.value = new_value;
        }
    }

    /// Merges `other`'s memrefs into `self`, returning handles re-pointed at
    /// whichever pool now owns the canonical instance for each key. Used by
    /// the runtime façade to let newly activated content reuse memrefs an
    /// already-active item is reading this frame.
    pub fn absorb(&mut self, other: &MemRefPool) {
        for handle in &other.order {
            let r = handle.borrow();
            self.by_key
                .entry((r.address, r.width))
                .or_insert_with(|| Rc::clone(handle));
        }
        self.order = self.by_key.values().cloned().collect();
    }

    /// Visits every interned memref in insertion order. Used by progress
    /// serialization, which persists the pool as one flat ordered list.
    pub fn for_each(&self, mut f: impl FnMut(&MemRef)) {
        for handle in &self.order {
            f(&handle.borrow());
        }
    }

    /// Re-seeds an already-interned (or freshly interned) `(address, width)`
    /// memref's delta fields from a deserialized snapshot.
    pub fn restore(&mut self, address: u32, width: u8, value: u32, previous: u32, prior: u32, changed: bool) {
        let handle = self.intern(address, width);
        let mut r = handle.borrow_mut();
        r.value = value;
        r.previous = previous;
        r.prior = prior;
        r.changed = changed;
    }
}

/// Reads `width` bytes at `address` directly through `peek`, bypassing the
/// pool. Used for `AddAddress` indirection, where the effective address is
/// only known at evaluation time and the read must not be interned.
pub fn read_live<P: Peek + ?Sized>(peek: &mut P, address: u32, width: u8) -> u32 {
    peek.peek(address, width)
}

/// Applies a [`MemSize`] view transform to a raw little-endian-packed value
/// of `size.shared_size()` bytes, returning the `(bits, is_float)` pair:
/// integer views return their bits in the low word, float views return the
/// IEEE-754 bit pattern of an `f64` (via [`f64::to_bits`]) tagged `is_float`.
pub fn apply_view(raw: u32, size: MemSize) -> ViewResult {
    use MemSize::*;
    match size {
        U8 | U16LE | U24LE | U32LE => ViewResult::Int(raw),
        U16BE => ViewResult::Int(swap_bytes(raw, 2)),
        U24BE => ViewResult::Int(swap_bytes(raw, 3)),
        U32BE => ViewResult::Int(swap_bytes(raw, 4)),
        LowNibble => ViewResult::Int(raw & 0xF),
        HighNibble => ViewResult::Int((raw >> 4) & 0xF),
        Bit0 => ViewResult::Int((raw >> 0) & 1),
        Bit1 => ViewResult::Int((raw >> 1) & 1),
        Bit2 => ViewResult::Int((raw >> 2) & 1),
        Bit3 => ViewResult::Int((raw >> 3) & 1),
        Bit4 => ViewResult::Int((raw >> 4) & 1),
        Bit5 => ViewResult::Int((raw >> 5) & 1),
        Bit6 => ViewResult::Int((raw >> 6) & 1),
        Bit7 => ViewResult::Int((raw >> 7) & 1),
        BitCount => ViewResult::Int((raw as u8).count_ones()),
        Float32LE => ViewResult::Float(f32::from_bits(raw) as f64),
        Float32BE => ViewResult::Float(f32::from_bits(swap_bytes(raw, 4)) as f64),
        MBF32 => ViewResult::Float(decode_mbf32(raw)),
        MBF32LE => ViewResult::Float(decode_mbf32(swap_bytes(raw, 4))),
        Double32LE => ViewResult::Float(f64::from_bits((raw as u64) << 32)),
        Double32BE => ViewResult::Float(f64::from_bits((swap_bytes(raw, 4) as u64) << 32)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewResult {
    Int(u32),
    Float(f64),
}

fn swap_bytes(raw: u32, width: u8) -> u32 {
    let mut buf = [0u8; 4];
    LittleEndian::write_u32(&mut buf, raw);
    match width {
        2 => {
            let v = BigEndian::read_u16(&buf[..2]);
            v as u32
        }
        3 => {
            let mut be = [0u8; 4];
            be[1] = buf[0];
            be[2] = buf[1];
            be[3] = buf[2];
            BigEndian::read_u32(&be)
        }
        4 => BigEndian::read_u32(&buf),
        _ => raw,
    }
}

/// Decodes a 32-bit Microsoft Basic Float bit pattern into an `f64`.
///
/// MBF stores the exponent (biased by 129) in the top byte and the sign in
/// the high bit of the next byte, with an implicit leading mantissa bit.
fn decode_mbf32(bits: u32) -> f64 {
    let exponent = (bits >> 24) & 0xFF;
    if exponent == 0 {
        return 0.0;
    }
    let sign = if (bits >> 23) & 1 != 0 { -1.0 } else { 1.0 };
    let mantissa_bits = bits & 0x007F_FFFF;
    let mantissa = 1.0 + (mantissa_bits as f64) / (1u64 << 23) as f64;
    sign * mantissa * 2f64.powi(exponent as i32 - 129)
}
