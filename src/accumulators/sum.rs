#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// A running total with a Neumaier correction term, so that adding many
/// small numbers to a large one does not lose them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sum {
    large: f64,
    small: f64,
}

impl Sum {
    pub fn new(value: f64) -> Sum {
        Sum {
            large: value,
            small: 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.large + self.small
    }

    /// The running total without its correction.
    pub fn large(&self) -> f64 {
        self.large
    }

    /// The accumulated round-off correction.
    pub fn small(&self) -> f64 {
        self.small
    }

    pub fn add(&mut self, x: f64) {
        let total = self.large + x;
        if self.large.abs() >= x.abs() {
            self.small += (self.large - total) + x;
        } else {
            self.small += (x - total) + self.large;
        }
        self.large = total;
    }
}

impl Accumulator for Sum {
    const NAME: &'static str = "sum";

    fn increment(&mut self) -> Result<()> {
        self.add(1.0);
        Ok(())
    }

    fn add_weight(&mut self, weight: f64) -> Result<()> {
        self.add(weight);
        Ok(())
    }

    fn merge(&mut self, other: &Sum) {
        self.add(other.large);
        self.small += other.small;
    }

    fn scale(&mut self, factor: f64) {
        self.large *= factor;
        self.small *= factor;
    }
}

/// Sum of weights and sum of squared weights. The latter is the variance
/// estimate of the former.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedSum {
    sum: f64,
    sum2: f64,
}

impl WeightedSum {
    pub fn new(value: f64, variance: f64) -> WeightedSum {
        WeightedSum {
            sum: value,
            sum2: variance,
        }
    }

    pub fn value(&self) -> f64 {
        self.sum
    }

    pub fn variance(&self) -> f64 {
        self.sum2
    }
}

impl Accumulator for WeightedSum {
    const NAME: &'static str = "weighted sum";

    fn increment(&mut self) -> Result<()> {
        self.sum += 1.0;
        self.sum2 += 1.0;
        Ok(())
    }

    fn add_weight(&mut self, weight: f64) -> Result<()> {
        self.sum += weight;
        self.sum2 += weight * weight;
        Ok(())
    }

    fn merge(&mut self, other: &WeightedSum) {
        self.sum += other.sum;
        self.sum2 += other.sum2;
    }

    fn scale(&mut self, factor: f64) {
        self.sum *= factor;
        self.sum2 *= factor * factor;
    }
}

#[test]
fn sum_keeps_small_terms() {
    let mut s = Sum::new(1e100);
    let mut naive = 1e100_f64;
    for _ in 0..1000 {
        s.add(1.0);
        naive += 1.0;
    }
    assert_eq!(s.large(), 1e100);
    assert_eq!(s.small(), 1000.0);
    s.add(-1e100);
    naive -= 1e100;
    assert_eq!(s.large(), 0.0);
    assert_eq!(s.small(), 1000.0);
    assert_eq!(s.value(), 1000.0);
    assert_eq!(naive, 0.0);
}

#[test]
fn sum_merge_and_scale() {
    let mut a = Sum::default();
    a.increment().unwrap();
    a.add_weight(0.5).unwrap();
    let mut b = Sum::new(2.0);
    b.merge(&a);
    assert_eq!(b.value(), 3.5);
    b.scale(2.0);
    assert_eq!(b.value(), 7.0);
    assert!(b.add_sample(&[1.0]).is_err());
}

#[test]
fn weighted_sum_tracks_variance() {
    let mut a = WeightedSum::default();
    a.increment().unwrap();
    a.merge(&WeightedSum::new(1.0, 0.0));
    a.add_weight(1.0).unwrap();
    assert_eq!(a.value(), 3.0);
    assert_eq!(a.variance(), 2.0);
    a.add_weight(2.0).unwrap();
    assert_eq!(a.value(), 5.0);
    assert_eq!(a.variance(), 6.0);
    a.scale(2.0);
    assert_eq!(a.value(), 10.0);
    assert_eq!(a.variance(), 24.0);
}
