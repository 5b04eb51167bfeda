//! The axis capability a histogram is built from.
//!
//! An axis maps a coordinate to a bin id in `[-1, size]`, where `-1` and
//! `size` name the underflow and overflow slots when the axis has them.
//! How a coordinate lands in a bin is entirely up to the axis; the
//! histogram only drives `size`, `extent` and `index`.

use std::fmt::Debug;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{HistError, Result};

mod category;
mod integer;
mod regular;
mod variant;

pub use category::Category;
pub use integer::Integer;
pub use regular::Regular;
pub use variant::AnyAxis;

bitflags! {
    /// Which out-of-range slots an axis carries, and whether it wraps.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Options: u8 {
        /// Coordinates below the range land in an extra slot.
        const UNDERFLOW = 0b001;
        /// Coordinates at or above the range land in an extra slot.
        const OVERFLOW = 0b010;
        /// Coordinates wrap around the range.
        const CIRCULAR = 0b100;
        /// Both flow slots; the default for numeric axes.
        const UOFLOW = Self::UNDERFLOW.bits() | Self::OVERFLOW.bits();
    }
}

impl Options {
    /// Whether an underflow slot exists.
    pub fn underflow(self) -> bool {
        self.contains(Options::UNDERFLOW)
    }

    /// Whether an overflow slot exists.
    pub fn overflow(self) -> bool {
        self.contains(Options::OVERFLOW)
    }

    /// Whether coordinates wrap.
    pub fn circular(self) -> bool {
        self.contains(Options::CIRCULAR)
    }
}

/// One component of a coordinate handed to an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    /// A real number, for continuous axes.
    Real(f64),
    /// An integer, for integer axes or category indices.
    Int(i64),
    /// A label, for category axes.
    Str(&'a str),
}

impl<'a> Value<'a> {
    /// Type name shown in argument errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Real(_) => "f64",
            Value::Int(_) => "i64",
            Value::Str(_) => "str",
        }
    }
}

impl From<f64> for Value<'_> {
    fn from(x: f64) -> Self {
        Value::Real(x)
    }
}

impl From<f32> for Value<'_> {
    fn from(x: f32) -> Self {
        Value::Real(x.into())
    }
}

impl From<i64> for Value<'_> {
    fn from(x: i64) -> Self {
        Value::Int(x)
    }
}

impl From<i32> for Value<'_> {
    fn from(x: i32) -> Self {
        Value::Int(x.into())
    }
}

impl From<u32> for Value<'_> {
    fn from(x: u32) -> Self {
        Value::Int(x.into())
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Str(s)
    }
}

/// The capability every axis exposes to the histogram.
pub trait Axis: Debug {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    /// Number of ordinary bins.
    fn size(&self) -> usize;

    fn options(&self) -> Options;

    /// Number of storage slots this axis occupies: `size` plus any
    /// under/overflow slots.
    fn extent(&self) -> usize {
        let options = self.options();
        self.size() + options.underflow() as usize + options.overflow() as usize
    }

    /// Map a coordinate to a bin id in `[-1, size]`.
    ///
    /// Most axes take a single component; a rank-1 histogram forwards
    /// every component it was given, so an axis may accept more.
    fn index(&self, coord: &[Value<'_>]) -> Result<i32>;
}

impl<T: Axis + ?Sized> Axis for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn options(&self) -> Options {
        (**self).options()
    }

    fn extent(&self) -> usize {
        (**self).extent()
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        (**self).index(coord)
    }
}

impl<T: Axis + ?Sized> Axis for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn size(&self) -> usize {
        (**self).size()
    }

    fn options(&self) -> Options {
        (**self).options()
    }

    fn extent(&self) -> usize {
        (**self).extent()
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        (**self).index(coord)
    }
}

/// An ordered set of axes.
pub trait Axes {
    fn rank(&self) -> usize;

    fn axis(&self, i: usize) -> Option<&dyn Axis>;

    /// Total number of storage cells: the product of every axis' extent.
    /// Fails when that product does not fit in `usize`.
    fn bincount(&self) -> Result<usize> {
        (0..self.rank())
            .filter_map(|i| self.axis(i))
            .try_fold(1usize, |n, a| n.checked_mul(a.extent()))
            .ok_or_else(|| HistError::InvalidAxis("too many cells".into()))
    }
}

impl<T: Axis> Axes for Vec<T> {
    fn rank(&self) -> usize {
        self.len()
    }

    fn axis(&self, i: usize) -> Option<&dyn Axis> {
        self.get(i).map(|a| a as &dyn Axis)
    }
}

impl<T: Axis, const N: usize> Axes for [T; N] {
    fn rank(&self) -> usize {
        N
    }

    fn axis(&self, i: usize) -> Option<&dyn Axis> {
        self.get(i).map(|a| a as &dyn Axis)
    }
}

// Axes of rank > 1 see exactly one component each.
pub(crate) fn single<'v>(axis: &'static str, coord: &[Value<'v>]) -> Result<Value<'v>> {
    match coord {
        [v] => Ok(*v),
        _ => Err(HistError::ArgumentType {
            axis,
            expected: "a single value",
            found: "a tuple",
        }),
    }
}

pub(crate) fn mismatch(axis: &'static str, expected: &'static str, found: &Value<'_>) -> HistError {
    HistError::ArgumentType {
        axis,
        expected,
        found: found.type_name(),
    }
}

// Bin ids travel as i32.
pub(crate) fn check_size(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(HistError::InvalidAxis("an axis needs at least one bin".into()));
    }
    if size >= i32::MAX as usize {
        return Err(HistError::InvalidAxis(format!("{} bins is too many", size)));
    }
    Ok(size)
}

#[test]
fn options_compose() {
    let o = Options::UNDERFLOW | Options::OVERFLOW;
    assert_eq!(o, Options::UOFLOW);
    assert!(o.underflow() && o.overflow() && !o.circular());
    assert!(!Options::empty().overflow());
    assert!(Options::UOFLOW.contains(Options::OVERFLOW));
    assert!(!Options::OVERFLOW.contains(Options::UOFLOW));
    let shown = format!("{:?}", o);
    assert!(shown.contains("UNDERFLOW") && shown.contains("OVERFLOW"), "{}", shown);
}

#[test]
fn extent_counts_flow_slots() {
    let a = Integer::new(0, 4).unwrap();
    assert_eq!(a.size(), 4);
    assert_eq!(a.extent(), 6);
    let b = Integer::with_options(0, 4, Options::OVERFLOW).unwrap();
    assert_eq!(b.extent(), 5);
    let c = Integer::with_options(0, 4, Options::empty()).unwrap();
    assert_eq!(c.extent(), 4);
}

#[test]
fn bincount_multiplies_extents() {
    let axes = vec![Integer::new(0, 3).unwrap(), Integer::new(0, 4).unwrap()];
    assert_eq!(axes.rank(), 2);
    assert_eq!(axes.bincount(), Ok(5 * 6));

    let boxed: Vec<Box<dyn Axis>> = vec![
        Box::new(Regular::new(4, -2.0, 2.0).unwrap()),
        Box::new(Category::new(vec!["a", "b"]).unwrap()),
    ];
    assert_eq!(boxed.bincount(), Ok(6 * 2));
}

#[test]
fn bincount_reports_overflow() {
    let wide = || Integer::with_options(0, 1 << 16, Options::empty()).unwrap();
    let axes = vec![wide(), wide(), wide(), wide()];
    assert_eq!(
        axes.bincount(),
        Err(HistError::InvalidAxis("too many cells".into()))
    );
    assert_eq!(axes[..3].to_vec().bincount(), Ok(1 << 48));
}
