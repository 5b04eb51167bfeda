#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// Running mean and variance of the samples filled into a bin, updated
/// with Welford's algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mean {
    count: f64,
    mean: f64,
    dsum2: f64,
}

impl Mean {
    /// Rebuild from a count, a mean and an unbiased variance.
    pub fn new(count: f64, mean: f64, variance: f64) -> Mean {
        Mean {
            count,
            mean,
            dsum2: variance * (count - 1.0),
        }
    }

    pub fn count(&self) -> f64 {
        self.count
    }

    pub fn value(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance.
    pub fn variance(&self) -> f64 {
        self.dsum2 / (self.count - 1.0)
    }

    pub fn population_variance(&self) -> f64 {
        self.dsum2 / self.count
    }

    pub fn add(&mut self, x: f64) {
        self.count += 1.0;
        let delta = x - self.mean;
        self.mean += delta / self.count;
        self.dsum2 += delta * (x - self.mean);
    }
}

impl Accumulator for Mean {
    const NAME: &'static str = "mean";

    fn add_sample(&mut self, sample: &[f64]) -> Result<()> {
        let x = scalar(sample)?;
        self.add(x);
        Ok(())
    }

    fn merge(&mut self, other: &Mean) {
        if other.count == 0.0 {
            return;
        }
        if self.count == 0.0 {
            *self = *other;
            return;
        }
        let n = self.count + other.count;
        let delta = other.mean - self.mean;
        self.mean += delta * other.count / n;
        self.dsum2 += other.dsum2 + delta * delta * self.count * other.count / n;
        self.count = n;
    }

    fn scale(&mut self, factor: f64) {
        self.mean *= factor;
        self.dsum2 *= factor * factor;
    }
}

/// Weighted generalisation of [`Mean`]: tracks the sum of weights, the sum
/// of squared weights, the weighted mean and the weighted sum of squared
/// deviations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeightedMean {
    sum: f64,
    sum2: f64,
    mean: f64,
    dsum2: f64,
}

impl WeightedMean {
    /// Rebuild from the weight sums, a mean and an unbiased variance.
    pub fn new(sum: f64, sum2: f64, mean: f64, variance: f64) -> WeightedMean {
        WeightedMean {
            sum,
            sum2,
            mean,
            dsum2: variance * (sum - sum2 / sum),
        }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum2(&self) -> f64 {
        self.sum2
    }

    pub fn value(&self) -> f64 {
        self.mean
    }

    /// Unbiased weighted variance.
    pub fn variance(&self) -> f64 {
        self.dsum2 / (self.sum - self.sum2 / self.sum)
    }

    /// Add `x` with weight `weight`.
    pub fn add(&mut self, weight: f64, x: f64) {
        self.sum += weight;
        self.sum2 += weight * weight;
        let delta = x - self.mean;
        self.mean += weight * delta / self.sum;
        self.dsum2 += weight * delta * (x - self.mean);
    }
}

impl Accumulator for WeightedMean {
    const NAME: &'static str = "weighted mean";

    fn add_sample(&mut self, sample: &[f64]) -> Result<()> {
        let x = scalar(sample)?;
        self.add(1.0, x);
        Ok(())
    }

    fn add_weighted_sample(&mut self, weight: f64, sample: &[f64]) -> Result<()> {
        let x = scalar(sample)?;
        self.add(weight, x);
        Ok(())
    }

    fn merge(&mut self, other: &WeightedMean) {
        if other.sum == 0.0 {
            return;
        }
        if self.sum == 0.0 {
            *self = *other;
            return;
        }
        let w = self.sum + other.sum;
        let delta = other.mean - self.mean;
        self.mean += delta * other.sum / w;
        self.dsum2 += other.dsum2 + delta * delta * self.sum * other.sum / w;
        self.sum = w;
        self.sum2 += other.sum2;
    }

    fn scale(&mut self, factor: f64) {
        self.mean *= factor;
        self.dsum2 *= factor * factor;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const SAMPLES: [f64; 8] = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];

    #[test]
    fn welford() {
        let mut m = Mean::default();
        for x in SAMPLES.iter() {
            m.add_sample(&[*x]).unwrap();
        }
        assert_eq!(m.count(), 8.0);
        assert_relative_eq!(m.value(), 5.0, max_relative = 1e-12);
        assert_relative_eq!(m.population_variance(), 4.0, max_relative = 1e-12);
        assert_relative_eq!(m.variance(), 32.0 / 7.0, max_relative = 1e-12);
    }

    #[test]
    fn welford_is_stable_far_from_zero() {
        let mut m = Mean::default();
        for x in SAMPLES.iter() {
            m.add(x + 1e9);
        }
        assert_relative_eq!(m.value(), 1e9 + 5.0, max_relative = 1e-12);
        assert_relative_eq!(m.population_variance(), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn mean_merge_is_exact() {
        let (left, right) = SAMPLES.split_at(3);
        let mut a = Mean::default();
        left.iter().for_each(|x| a.add(*x));
        let mut b = Mean::default();
        right.iter().for_each(|x| b.add(*x));
        a.merge(&b);
        assert_eq!(a.count(), 8.0);
        assert_relative_eq!(a.value(), 5.0, max_relative = 1e-12);
        assert_relative_eq!(a.population_variance(), 4.0, max_relative = 1e-12);

        let mut empty = Mean::default();
        empty.merge(&a);
        assert_eq!(empty, a);
        a.merge(&Mean::default());
        assert_eq!(empty, a);
    }

    #[test]
    fn mean_roles() {
        let mut m = Mean::new(4.0, 2.0, 3.0);
        assert_relative_eq!(m.variance(), 3.0, max_relative = 1e-12);
        assert!(m.increment().is_err());
        assert_eq!(
            m.add_sample(&[1.0, 2.0]),
            Err(HistError::SampleArity {
                expected: 1,
                got: 2
            })
        );
        assert_eq!(m.count(), 4.0);
        m.scale(2.0);
        assert_relative_eq!(m.value(), 4.0, max_relative = 1e-12);
        assert_relative_eq!(m.variance(), 12.0, max_relative = 1e-12);
    }

    #[test]
    fn weighted_mean() {
        let mut m = WeightedMean::default();
        m.add_sample(&[1.0]).unwrap();
        m.add_weighted_sample(2.0, &[2.0]).unwrap();
        assert_eq!(m.sum(), 3.0);
        assert_eq!(m.sum2(), 5.0);
        assert_relative_eq!(m.value(), 5.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(m.variance(), 0.5, max_relative = 1e-12);
        assert!(m.add_weight(1.0).is_err());
    }

    #[test]
    fn unit_weights_match_mean() {
        let mut w = WeightedMean::default();
        let mut m = Mean::default();
        for x in SAMPLES.iter() {
            w.add(1.0, *x);
            m.add(*x);
        }
        assert_relative_eq!(w.value(), m.value(), max_relative = 1e-12);
        assert_relative_eq!(w.variance(), m.variance(), max_relative = 1e-12);
    }

    #[test]
    fn weighted_merge_is_exact() {
        let weights = [1.0, 0.5, 2.0, 1.5, 1.0, 3.0, 0.25, 1.0];
        let mut all = WeightedMean::default();
        let mut a = WeightedMean::default();
        let mut b = WeightedMean::default();
        for (i, (w, x)) in weights.iter().zip(SAMPLES.iter()).enumerate() {
            all.add(*w, *x);
            if i % 2 == 0 {
                a.add(*w, *x);
            } else {
                b.add(*w, *x);
            }
        }
        a.merge(&b);
        assert_relative_eq!(a.sum(), all.sum());
        assert_relative_eq!(a.sum2(), all.sum2());
        assert_relative_eq!(a.value(), all.value(), max_relative = 1e-12);
        assert_relative_eq!(a.variance(), all.variance(), max_relative = 1e-12);
    }
}
