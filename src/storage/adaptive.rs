use std::fmt::{self, Debug, Display};
use std::mem;
use std::ops::MulAssign;

use num_bigint::BigUint;
use num_traits::{FromPrimitive, ToPrimitive, Zero};
#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Storage;
use crate::{HistError, Result};

// 2^64: the smallest integral f64 a u64 cannot hold.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// The numeric type currently backing every cell of an
/// [`AdaptiveStorage`].
///
/// Integer counts climb `U8 → U16 → U32 → U64 → Big` and stay exact. `F64`
/// is entered as soon as a fractional or negative amount shows up and is
/// never left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Repr {
    Empty,
    U8,
    U16,
    U32,
    U64,
    Big,
    F64,
}

impl Repr {
    fn for_count(n: u128) -> Repr {
        if n <= u128::from(u8::MAX) {
            Repr::U8
        } else if n <= u128::from(u16::MAX) {
            Repr::U16
        } else if n <= u128::from(u32::MAX) {
            Repr::U32
        } else if n <= u128::from(u64::MAX) {
            Repr::U64
        } else {
            Repr::Big
        }
    }
}

/// The content of one cell, independent of how it is stored.
///
/// Equality compares numeric values: `Int(3)`, `Big(3)` and `Real(3.0)`
/// are all equal.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(untagged))]
pub enum Count {
    Int(u64),
    Big(BigUint),
    Real(f64),
}

impl Count {
    pub fn to_f64(&self) -> f64 {
        match self {
            Count::Int(n) => *n as f64,
            Count::Big(n) => n.to_f64().unwrap_or(f64::INFINITY),
            Count::Real(x) => *x,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Count::Int(n) => *n == 0,
            Count::Big(n) => n.is_zero(),
            Count::Real(x) => *x == 0.0,
        }
    }

    fn exact(&self) -> Option<BigUint> {
        match self {
            Count::Int(n) => Some(BigUint::from(*n)),
            Count::Big(n) => Some(n.clone()),
            Count::Real(x) if *x >= 0.0 && x.fract() == 0.0 => BigUint::from_f64(*x),
            Count::Real(_) => None,
        }
    }
}

impl PartialEq for Count {
    fn eq(&self, other: &Count) -> bool {
        match (self, other) {
            (Count::Int(a), Count::Int(b)) => a == b,
            (Count::Real(a), Count::Real(b)) => a == b,
            _ => match (self.exact(), other.exact()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialEq<u64> for Count {
    fn eq(&self, other: &u64) -> bool {
        *self == Count::Int(*other)
    }
}

impl PartialEq<f64> for Count {
    fn eq(&self, other: &f64) -> bool {
        *self == Count::Real(*other)
    }
}

impl Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Count::Int(n) => write!(f, "{}", n),
            Count::Big(n) => write!(f, "{}", n),
            Count::Real(x) => write!(f, "{}", x),
        }
    }
}

impl From<u64> for Count {
    fn from(n: u64) -> Count {
        Count::Int(n)
    }
}

impl From<f64> for Count {
    fn from(x: f64) -> Count {
        Count::Real(x)
    }
}

impl From<BigUint> for Count {
    fn from(n: BigUint) -> Count {
        Count::Big(n)
    }
}

trait Counter: Copy + Into<u64> + TryFrom<u64> {}

impl Counter for u8 {}
impl Counter for u16 {}
impl Counter for u32 {}
impl Counter for u64 {}

// Adds in place, or names the representation the sum would need.
fn add_in_place<T: Counter>(cell: &mut T, amount: u64) -> Option<Repr> {
    let current: u64 = (*cell).into();
    match current.checked_add(amount).map(T::try_from) {
        Some(Ok(sum)) => {
            *cell = sum;
            None
        }
        _ => Some(Repr::for_count(u128::from(current) + u128::from(amount))),
    }
}

fn peak<T: Counter + Ord>(cells: &[T]) -> u64 {
    cells.iter().copied().max().map_or(0, Into::into)
}

// Callers promote first, so every product fits.
fn scale_in_place<T: Counter>(cells: &mut [T], k: u64) {
    for cell in cells.iter_mut() {
        let n: u64 = (*cell).into();
        if let Ok(x) = T::try_from(n * k) {
            *cell = x;
        }
    }
}

fn cast<S: Copy, T: From<S>>(cells: &[S]) -> Vec<T> {
    cells.iter().map(|&x| T::from(x)).collect()
}

fn reals<S: Counter>(cells: &[S]) -> Vec<f64> {
    cells
        .iter()
        .map(|&x| {
            let n: u64 = x.into();
            n as f64
        })
        .collect()
}

#[derive(Clone)]
enum Buffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    Big(Vec<BigUint>),
    F64(Vec<f64>),
}

impl Buffer {
    fn len(&self) -> usize {
        match self {
            Buffer::U8(v) => v.len(),
            Buffer::U16(v) => v.len(),
            Buffer::U32(v) => v.len(),
            Buffer::U64(v) => v.len(),
            Buffer::Big(v) => v.len(),
            Buffer::F64(v) => v.len(),
        }
    }

    fn repr(&self) -> Repr {
        match self {
            Buffer::U8(_) => Repr::U8,
            Buffer::U16(_) => Repr::U16,
            Buffer::U32(_) => Repr::U32,
            Buffer::U64(_) => Repr::U64,
            Buffer::Big(_) => Repr::Big,
            Buffer::F64(_) => Repr::F64,
        }
    }

    fn get(&self, i: usize) -> Count {
        match self {
            Buffer::U8(v) => Count::Int(v[i].into()),
            Buffer::U16(v) => Count::Int(v[i].into()),
            Buffer::U32(v) => Count::Int(v[i].into()),
            Buffer::U64(v) => Count::Int(v[i]),
            Buffer::Big(v) => Count::Big(v[i].clone()),
            Buffer::F64(v) => Count::Real(v[i]),
        }
    }

    /// Convert every cell to `target`. Targets that are not wider than the
    /// current representation leave the buffer as it is.
    fn widen(self, target: Repr) -> Buffer {
        match (self, target) {
            (Buffer::U8(v), Repr::U16) => Buffer::U16(cast(&v)),
            (Buffer::U8(v), Repr::U32) => Buffer::U32(cast(&v)),
            (Buffer::U8(v), Repr::U64) => Buffer::U64(cast(&v)),
            (Buffer::U8(v), Repr::Big) => Buffer::Big(cast(&v)),
            (Buffer::U8(v), Repr::F64) => Buffer::F64(reals(&v)),
            (Buffer::U16(v), Repr::U32) => Buffer::U32(cast(&v)),
            (Buffer::U16(v), Repr::U64) => Buffer::U64(cast(&v)),
            (Buffer::U16(v), Repr::Big) => Buffer::Big(cast(&v)),
            (Buffer::U16(v), Repr::F64) => Buffer::F64(reals(&v)),
            (Buffer::U32(v), Repr::U64) => Buffer::U64(cast(&v)),
            (Buffer::U32(v), Repr::Big) => Buffer::Big(cast(&v)),
            (Buffer::U32(v), Repr::F64) => Buffer::F64(reals(&v)),
            (Buffer::U64(v), Repr::Big) => Buffer::Big(cast(&v)),
            (Buffer::U64(v), Repr::F64) => Buffer::F64(reals(&v)),
            (Buffer::Big(v), Repr::F64) => Buffer::F64(
                v.iter()
                    .map(|x| x.to_f64().unwrap_or(f64::INFINITY))
                    .collect(),
            ),
            (buffer, _) => buffer,
        }
    }
}

/// One counter per bin, stored in the narrowest type that holds every
/// cell. The whole buffer is widened the moment an update would not fit,
/// so counts never wrap.
#[derive(Clone)]
pub struct AdaptiveStorage {
    buffer: Buffer,
}

impl Default for AdaptiveStorage {
    fn default() -> AdaptiveStorage {
        AdaptiveStorage::new(0)
    }
}

impl Debug for AdaptiveStorage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AdaptiveStorage<{:?}>[", self.repr())?;
        for (i, count) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", count)?;
        }
        f.write_str("]")
    }
}

impl PartialEq for AdaptiveStorage {
    fn eq(&self, other: &AdaptiveStorage) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl AdaptiveStorage {
    /// `n` zeroed cells in the narrowest representation.
    pub fn new(n: usize) -> AdaptiveStorage {
        AdaptiveStorage {
            buffer: Buffer::U8(vec![0; n]),
        }
    }

    /// Rebuild from cell values, picking the narrowest representation that
    /// holds all of them.
    pub fn from_counts<I: IntoIterator<Item = Count>>(counts: I) -> AdaptiveStorage {
        let counts: Vec<Count> = counts.into_iter().collect();
        let mut storage = AdaptiveStorage::new(counts.len());
        for (i, count) in counts.iter().enumerate() {
            storage.add_value(i, count);
        }
        storage
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn repr(&self) -> Repr {
        if self.is_empty() {
            Repr::Empty
        } else {
            self.buffer.repr()
        }
    }

    pub fn get(&self, index: usize) -> Count {
        self.buffer.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = Count> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    /// Total over all cells, exact as long as every cell is an integer.
    pub fn sum(&self) -> Count {
        let mut total = AdaptiveStorage::new(1);
        for count in self.iter() {
            total.add_value(0, &count);
        }
        total.get(0)
    }

    pub fn reset(&mut self, n: usize) {
        log::debug!("resetting adaptive storage to {} cells", n);
        self.buffer = Buffer::U8(vec![0; n]);
    }

    pub fn increment(&mut self, index: usize) {
        self.add_count(index, 1);
    }

    /// Add a non-negative integer amount, widening as far as the new value
    /// requires.
    pub fn add_count(&mut self, index: usize, amount: u64) {
        let needed = match &mut self.buffer {
            Buffer::U8(v) => add_in_place(&mut v[index], amount),
            Buffer::U16(v) => add_in_place(&mut v[index], amount),
            Buffer::U32(v) => add_in_place(&mut v[index], amount),
            Buffer::U64(v) => add_in_place(&mut v[index], amount),
            Buffer::Big(v) => {
                v[index] += amount;
                None
            }
            Buffer::F64(v) => {
                v[index] += amount as f64;
                None
            }
        };
        if let Some(repr) = needed {
            self.promote(repr);
            self.add_count(index, amount);
        }
    }

    pub fn add_big(&mut self, index: usize, amount: &BigUint) {
        if let Some(n) = amount.to_u64() {
            self.add_count(index, n);
            return;
        }
        self.promote(Repr::Big);
        match &mut self.buffer {
            Buffer::Big(v) => v[index] += amount,
            Buffer::F64(v) => v[index] += amount.to_f64().unwrap_or(f64::INFINITY),
            // promote(Big) leaves only Big or F64
            _ => {}
        }
    }

    /// Add an arbitrary amount. Non-negative integral amounts keep the
    /// storage exact; anything else moves it to `f64`.
    pub fn add(&mut self, index: usize, x: f64) {
        if x >= 0.0 && x.fract() == 0.0 {
            if x < U64_LIMIT {
                self.add_count(index, x as u64);
                return;
            }
            if let Some(n) = BigUint::from_f64(x) {
                self.add_big(index, &n);
                return;
            }
        }
        self.promote(Repr::F64);
        if let Buffer::F64(v) = &mut self.buffer {
            v[index] += x;
        }
    }

    pub fn add_value(&mut self, index: usize, value: &Count) {
        match value {
            Count::Int(n) => self.add_count(index, *n),
            Count::Big(n) => self.add_big(index, n),
            Count::Real(x) => self.add(index, *x),
        }
    }

    /// Multiply every cell. Non-negative integral factors keep the storage
    /// exact; anything else moves it to `f64`.
    pub fn scale(&mut self, factor: f64) {
        if factor >= 0.0 && factor.fract() == 0.0 && factor < U64_LIMIT {
            self.scale_count(factor as u64);
            return;
        }
        self.promote(Repr::F64);
        if let Buffer::F64(v) = &mut self.buffer {
            v.iter_mut().for_each(|x| *x *= factor);
        }
    }

    fn scale_count(&mut self, k: u64) {
        let top = match &self.buffer {
            Buffer::U8(v) => peak(v),
            Buffer::U16(v) => peak(v),
            Buffer::U32(v) => peak(v),
            Buffer::U64(v) => peak(v),
            Buffer::Big(_) | Buffer::F64(_) => 0,
        };
        self.promote(Repr::for_count(u128::from(top) * u128::from(k)));
        match &mut self.buffer {
            Buffer::U8(v) => scale_in_place(v, k),
            Buffer::U16(v) => scale_in_place(v, k),
            Buffer::U32(v) => scale_in_place(v, k),
            Buffer::U64(v) => scale_in_place(v, k),
            Buffer::Big(v) => v.iter_mut().for_each(|x| *x *= k),
            Buffer::F64(v) => v.iter_mut().for_each(|x| *x *= k as f64),
        }
    }

    /// Cell-wise `+=`. The result is at least as wide as either operand.
    pub fn merge(&mut self, other: &AdaptiveStorage) -> Result<()> {
        if self.len() != other.len() {
            return Err(HistError::StorageSize {
                cells: other.len(),
                expected: self.len(),
            });
        }
        self.promote(other.buffer.repr());
        for (i, count) in other.iter().enumerate() {
            if !count.is_zero() {
                self.add_value(i, &count);
            }
        }
        Ok(())
    }

    fn promote(&mut self, target: Repr) {
        let from = self.buffer.repr();
        if target <= from {
            return;
        }
        log::trace!(
            "promoting {} cells from {:?} to {:?}",
            self.len(),
            from,
            target
        );
        let buffer = mem::replace(&mut self.buffer, Buffer::U8(Vec::new()));
        self.buffer = buffer.widen(target);
    }
}

impl MulAssign<f64> for AdaptiveStorage {
    fn mul_assign(&mut self, factor: f64) {
        self.scale(factor);
    }
}

impl Storage for AdaptiveStorage {
    type Value = Count;

    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn reset(&mut self, n: usize) -> Result<()> {
        AdaptiveStorage::reset(self, n);
        Ok(())
    }

    fn get(&self, index: usize) -> Count {
        self.buffer.get(index)
    }

    fn increment(&mut self, index: usize) -> Result<()> {
        self.add_count(index, 1);
        Ok(())
    }

    fn add_weight(&mut self, index: usize, weight: f64) -> Result<()> {
        self.add(index, weight);
        Ok(())
    }

    fn add_sample(&mut self, _index: usize, _sample: &[f64]) -> Result<()> {
        Err(HistError::UnsupportedRole {
            cell: "adaptive storage",
            role: "sample",
        })
    }

    fn add_weighted_sample(&mut self, _index: usize, _weight: f64, _sample: &[f64]) -> Result<()> {
        Err(HistError::UnsupportedRole {
            cell: "adaptive storage",
            role: "weighted sample",
        })
    }

    fn merge(&mut self, other: &AdaptiveStorage) -> Result<()> {
        AdaptiveStorage::merge(self, other)
    }

    fn scale(&mut self, factor: f64) {
        AdaptiveStorage::scale(self, factor);
    }
}

#[cfg(feature = "serde")]
impl Serialize for AdaptiveStorage {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for AdaptiveStorage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Count>::deserialize(deserializer).map(AdaptiveStorage::from_counts)
    }
}

#[test]
fn promotes_on_256th_increment() {
    let mut s = AdaptiveStorage::new(2);
    s.add_count(1, 5);
    for _ in 0..255 {
        s.increment(0);
    }
    assert_eq!(s.repr(), Repr::U8);
    assert_eq!(s.get(0), 255u64);
    s.increment(0);
    assert_eq!(s.repr(), Repr::U16);
    assert_eq!(s.get(0), 256u64);
    assert_eq!(s.get(1), 5u64);
}

#[test]
fn climbs_the_integer_ladder() {
    let mut s = AdaptiveStorage::new(1);
    s.add_count(0, u64::from(u16::MAX) + 1);
    assert_eq!(s.repr(), Repr::U32);
    s.add_count(0, u64::from(u32::MAX));
    assert_eq!(s.repr(), Repr::U64);
    s.add_count(0, u64::MAX);
    assert_eq!(s.repr(), Repr::Big);
    let expected =
        BigUint::from(u64::from(u16::MAX) + 1) + BigUint::from(u32::MAX) + BigUint::from(u64::MAX);
    assert_eq!(s.get(0), Count::Big(expected));
    s.increment(0);
    assert_eq!(s.repr(), Repr::Big);
}

#[test]
fn exact_beyond_f64_mantissa() {
    let mut s = AdaptiveStorage::new(1);
    s.add_count(0, 1 << 53);
    s.increment(0);
    assert_eq!(s.repr(), Repr::U64);
    assert_eq!(s.get(0), (1u64 << 53) + 1);
}

#[test]
fn real_amounts_move_to_f64() {
    let mut s = AdaptiveStorage::new(2);
    s.add(0, 3.0);
    assert_eq!(s.repr(), Repr::U8);
    s.add(1, 0.5);
    assert_eq!(s.repr(), Repr::F64);
    assert_eq!(s.get(0), 3.0);
    assert_eq!(s.get(1), 0.5);
    s.add_count(0, u64::MAX);
    assert_eq!(s.repr(), Repr::F64);

    let mut t = AdaptiveStorage::new(1);
    t.add(0, -1.0);
    assert_eq!(t.repr(), Repr::F64);
    assert_eq!(t.get(0), -1.0);
}

#[test]
fn huge_integral_amount_goes_big() {
    let mut s = AdaptiveStorage::new(1);
    s.add(0, 1e20);
    assert_eq!(s.repr(), Repr::Big);
    assert_eq!(s.get(0), 1e20);
}

#[test]
fn equality_ignores_representation() {
    let mut a = AdaptiveStorage::new(3);
    for _ in 0..300 {
        a.increment(1);
    }
    let mut b = AdaptiveStorage::new(3);
    b.add(1, 300.0);
    let mut c = AdaptiveStorage::new(3);
    c.add_count(1, 299);
    c.add(0, 0.5);
    c.add(0, -0.5);
    c.increment(1);
    assert_eq!(a.repr(), Repr::U16);
    assert_eq!(c.repr(), Repr::F64);
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_ne!(a, AdaptiveStorage::new(3));
    assert_ne!(a, AdaptiveStorage::new(2));
}

#[test]
fn reset_zeroes_everything() {
    let mut s = AdaptiveStorage::new(2);
    s.add(0, 0.25);
    s.reset(4);
    assert_eq!(s.len(), 4);
    assert_eq!(s.repr(), Repr::U8);
    assert!(s.iter().all(|c| c == 0u64));
    s.reset(0);
    assert_eq!(s.repr(), Repr::Empty);
}

#[test]
fn integral_scale_stays_exact() {
    let mut s = AdaptiveStorage::new(2);
    s.increment(0);
    s *= 3.0;
    assert_eq!(s.repr(), Repr::U8);
    assert_eq!(s.get(0), 3u64);
    assert_eq!(s.get(1), 0u64);
    s.add_count(1, 2);
    s *= 100.0;
    assert_eq!(s.repr(), Repr::U16);
    assert_eq!(s.get(0), 300u64);
    assert_eq!(s.get(1), 200u64);
    s *= 0.5;
    assert_eq!(s.repr(), Repr::F64);
    assert_eq!(s.get(0), 150u64);

    let mut big = AdaptiveStorage::new(1);
    big.add_count(0, u64::MAX);
    big *= 2.0;
    assert_eq!(big.repr(), Repr::Big);
    assert_eq!(big.get(0), Count::Big(BigUint::from(u64::MAX) * 2u32));
}

#[test]
fn merge_takes_the_wider_representation() {
    let mut a = AdaptiveStorage::new(2);
    a.increment(1);
    let mut b = AdaptiveStorage::new(2);
    b.add_count(0, 1000);
    b.increment(1);
    a.merge(&b).unwrap();
    assert_eq!(a.repr(), Repr::U16);
    assert_eq!(a.get(0), 1000u64);
    assert_eq!(a.get(1), 2u64);

    let mut c = AdaptiveStorage::new(2);
    c.add(0, 0.5);
    a.merge(&c).unwrap();
    assert_eq!(a.repr(), Repr::F64);
    assert_eq!(a.get(0), 1000.5);

    assert_eq!(
        a.merge(&AdaptiveStorage::new(3)),
        Err(HistError::StorageSize {
            cells: 3,
            expected: 2
        })
    );
}

#[test]
fn from_counts_picks_narrowest() {
    let s = AdaptiveStorage::from_counts(vec![Count::Int(1), Count::Real(300.0)]);
    assert_eq!(s.repr(), Repr::U16);
    assert_eq!(s.get(1), 300u64);
    let t = AdaptiveStorage::from_counts(vec![Count::Real(2.0), Count::Int(0)]);
    assert_eq!(t.repr(), Repr::U8);
    let u = AdaptiveStorage::from_counts(vec![Count::Real(0.5)]);
    assert_eq!(u.repr(), Repr::F64);
}

#[test]
fn sum_and_debug() {
    let mut s = AdaptiveStorage::new(3);
    s.add_count(0, 200);
    s.add_count(2, 200);
    assert_eq!(s.sum(), 400u64);
    assert_eq!(format!("{:?}", s), "AdaptiveStorage<U8>[200 0 200]");
    assert_eq!(AdaptiveStorage::default().sum(), 0u64);
}

#[test]
fn samples_are_rejected() {
    let mut s = AdaptiveStorage::new(1);
    assert!(Storage::add_sample(&mut s, 0, &[1.0]).is_err());
    assert!(Storage::add_weighted_sample(&mut s, 0, 2.0, &[1.0]).is_err());
    Storage::add_weight(&mut s, 0, 2.0).unwrap();
    assert_eq!(s.get(0), 2u64);
}
