#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// One bin per integer in `[min, max)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Integer {
    min: i64,
    max: i64,
    options: Options,
}

impl Integer {
    pub fn new(min: i64, max: i64) -> Result<Integer> {
        Integer::with_options(min, max, Options::UOFLOW)
    }

    pub fn with_options(min: i64, max: i64, options: Options) -> Result<Integer> {
        if min >= max {
            return Err(HistError::InvalidAxis(format!(
                "integer axis needs min < max, got [{}, {})",
                min, max
            )));
        }
        if options.circular() {
            return Err(HistError::InvalidAxis(
                "an integer axis cannot be circular".into(),
            ));
        }
        let span = max.checked_sub(min).and_then(|s| usize::try_from(s).ok());
        match span {
            Some(size) => check_size(size)?,
            None => return Err(HistError::InvalidAxis("integer axis range overflows".into())),
        };
        Ok(Integer { min, max, options })
    }

    fn bin(&self, i: i64) -> i32 {
        if i < self.min {
            -1
        } else if i >= self.max {
            self.size() as i32
        } else {
            (i - self.min) as i32
        }
    }
}

impl Axis for Integer {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn size(&self) -> usize {
        (self.max - self.min) as usize
    }

    fn options(&self) -> Options {
        self.options
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        match single(self.name(), coord)? {
            Value::Int(i) => Ok(self.bin(i)),
            Value::Real(x) if x.is_nan() => Ok(self.size() as i32),
            // saturating cast keeps infinities on the right side
            Value::Real(x) => Ok(self.bin(x.floor() as i64)),
            other => Err(mismatch(self.name(), "i64", &other)),
        }
    }
}

#[test]
fn integer_bins() {
    let a = Integer::new(-1, 3).unwrap();
    let idx = |i: i64| a.index(&[Value::Int(i)]).unwrap();
    assert_eq!(a.size(), 4);
    assert_eq!(idx(-3), -1);
    assert_eq!(idx(-2), -1);
    assert_eq!(idx(-1), 0);
    assert_eq!(idx(0), 1);
    assert_eq!(idx(2), 3);
    assert_eq!(idx(3), 4);
    assert_eq!(idx(4), 4);
    assert_eq!(a.index(&[Value::Real(0.5)]).unwrap(), 1);
    assert_eq!(a.index(&[Value::Real(-1.5)]).unwrap(), -1);
    assert_eq!(a.index(&[Value::Real(f64::INFINITY)]).unwrap(), 4);
}

#[test]
fn integer_rejects_bad_input() {
    assert!(Integer::new(2, -1).is_err());
    assert!(Integer::new(0, 0).is_err());
    assert!(Integer::with_options(0, 2, Options::CIRCULAR).is_err());
    let a = Integer::new(0, 2).unwrap();
    assert!(a.index(&[Value::Str("1")]).is_err());
}
