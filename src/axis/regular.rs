#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// Equal-width bins over `[min, max)`.
///
/// A circular axis wraps every coordinate back into `[min, max)`, so it
/// never underflows; its only out-of-range outcome is NaN, which goes to
/// the overflow slot if there is one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Regular {
    bins: usize,
    min: f64,
    delta: f64,
    options: Options,
}

impl Regular {
    pub fn new(bins: usize, min: f64, max: f64) -> Result<Regular> {
        Regular::with_options(bins, min, max, Options::UOFLOW)
    }

    pub fn with_options(bins: usize, min: f64, max: f64, options: Options) -> Result<Regular> {
        let bins = check_size(bins)?;
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(HistError::InvalidAxis(format!(
                "regular axis needs finite min < max, got [{}, {})",
                min, max
            )));
        }
        if options.circular() && options.underflow() {
            return Err(HistError::InvalidAxis(
                "a circular axis cannot underflow".into(),
            ));
        }
        Ok(Regular {
            bins,
            min,
            delta: max - min,
            options,
        })
    }

    /// A wrapping axis of `bins` bins starting at `phase` and spanning
    /// `perimeter`.
    pub fn circular(bins: usize, phase: f64, perimeter: f64) -> Result<Regular> {
        Regular::with_options(
            bins,
            phase,
            phase + perimeter,
            Options::CIRCULAR | Options::OVERFLOW,
        )
    }

    /// Lower edge of bin `i`; `i == size` gives the upper edge of the range.
    pub fn edge(&self, i: i32) -> f64 {
        self.min + self.delta * f64::from(i) / self.bins as f64
    }

    fn bin(&self, x: f64) -> i32 {
        let mut z = (x - self.min) / self.delta;
        if self.options.circular() {
            z -= z.floor();
            // tiny negative z rounds up to 1.0
            if z >= 1.0 {
                z = 0.0;
            }
        }
        if z.is_nan() || z >= 1.0 {
            self.bins as i32
        } else if z < 0.0 {
            -1
        } else {
            ((z * self.bins as f64) as i32).min(self.bins as i32 - 1)
        }
    }
}

impl Axis for Regular {
    fn name(&self) -> &'static str {
        "regular"
    }

    fn size(&self) -> usize {
        self.bins
    }

    fn options(&self) -> Options {
        self.options
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        match single(self.name(), coord)? {
            Value::Real(x) => Ok(self.bin(x)),
            Value::Int(i) => Ok(self.bin(i as f64)),
            other => Err(mismatch(self.name(), "f64", &other)),
        }
    }
}

#[test]
fn regular_bins() {
    let a = Regular::new(4, 1.0, 2.0).unwrap();
    let idx = |x: f64| a.index(&[Value::Real(x)]).unwrap();
    assert_eq!(idx(-1.0), -1);
    assert_eq!(idx(0.99), -1);
    assert_eq!(idx(1.0), 0);
    assert_eq!(idx(1.249), 0);
    assert_eq!(idx(1.25), 1);
    assert_eq!(idx(1.5), 2);
    assert_eq!(idx(1.999), 3);
    assert_eq!(idx(2.0), 4);
    assert_eq!(idx(20.0), 4);
    assert_eq!(idx(f64::NAN), 4);
    assert_eq!(a.index(&[Value::Int(1)]).unwrap(), 0);
    assert_eq!(a.edge(1), 1.25);
}

#[test]
fn regular_rejects_bad_input() {
    assert!(Regular::new(0, 1.0, 2.0).is_err());
    assert!(Regular::new(1, 2.0, 1.0).is_err());
    assert!(Regular::new(1, 1.0, f64::INFINITY).is_err());
    let a = Regular::new(4, 1.0, 2.0).unwrap();
    assert_eq!(
        a.index(&[Value::Str("x")]),
        Err(HistError::ArgumentType {
            axis: "regular",
            expected: "f64",
            found: "str"
        })
    );
    assert!(a.index(&[Value::Real(1.0), Value::Real(1.0)]).is_err());
}

#[test]
fn circular_wraps() {
    let a = Regular::circular(4, 0.0, 4.0).unwrap();
    let idx = |x: f64| a.index(&[Value::Real(x)]).unwrap();
    assert_eq!(a.extent(), 5);
    assert_eq!(idx(0.5), 0);
    assert_eq!(idx(3.5), 3);
    assert_eq!(idx(4.5), 0);
    assert_eq!(idx(-0.5), 3);
    assert_eq!(idx(-7.5), 0);
    assert_eq!(idx(f64::NAN), 4);
}
