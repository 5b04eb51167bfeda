//! Sorting fill arguments into coordinates, an optional weight and an
//! optional sample, and routing them to the matching cell update.

use smallvec::SmallVec;

use super::*;

/// Coordinate components of one observation. Up to four live inline.
pub type Coords<'a> = SmallVec<[Value<'a>; 4]>;

/// Marks a fill argument as the observation's weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight(pub f64);

/// Marks fill arguments as the sample fed to the cell's accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample<'a>(pub &'a [f64]);

pub fn weight(w: f64) -> Weight {
    Weight(w)
}

pub fn sample(values: &[f64]) -> Sample<'_> {
    Sample(values)
}

/// A single fill argument of any role.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Coord(Value<'a>),
    Weight(Weight),
    Sample(Sample<'a>),
}

impl<'a> From<Value<'a>> for Arg<'a> {
    fn from(v: Value<'a>) -> Self {
        Arg::Coord(v)
    }
}

macro_rules! coord_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg<'_> {
                fn from(v: $t) -> Self {
                    Arg::Coord(v.into())
                }
            }
        )*
    };
}

coord_from!(f64, f32, i64, i32, u32);

impl<'a> From<&'a str> for Arg<'a> {
    fn from(s: &'a str) -> Self {
        Arg::Coord(Value::Str(s))
    }
}

impl From<Weight> for Arg<'_> {
    fn from(w: Weight) -> Self {
        Arg::Weight(w)
    }
}

impl<'a> From<Sample<'a>> for Arg<'a> {
    fn from(s: Sample<'a>) -> Self {
        Arg::Sample(s)
    }
}

/// One observation: coordinates plus the optional weight and sample.
///
/// ```
/// use histoire::{Fill, Histogram, Integer, VecStorage, WeightedMean};
///
/// let axes = vec![Integer::new(0, 4).unwrap()];
/// let mut h = Histogram::with_storage(axes, VecStorage::<WeightedMean>::default()).unwrap();
/// h.fill_with(&Fill::new([2]).weight(2.0).sample(&[1.5])).unwrap();
/// assert_eq!(h.at(&[2]).unwrap().value(), 1.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fill<'a> {
    coords: Coords<'a>,
    weight: Option<Weight>,
    sample: Option<Sample<'a>>,
}

impl<'a> Fill<'a> {
    pub fn new<I, V>(coords: I) -> Fill<'a>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'a>>,
    {
        Fill {
            coords: coords.into_iter().map(Into::into).collect(),
            weight: None,
            sample: None,
        }
    }

    pub fn weight(mut self, w: f64) -> Fill<'a> {
        self.weight = Some(Weight(w));
        self
    }

    pub fn sample(mut self, values: &'a [f64]) -> Fill<'a> {
        self.sample = Some(Sample(values));
        self
    }

    /// Sort a flat argument list by role. Plain values are coordinates and
    /// keep their order; at most one weight and one sample may appear,
    /// anywhere in the list.
    pub fn classify<I>(args: I) -> Result<Fill<'a>>
    where
        I: IntoIterator,
        I::Item: Into<Arg<'a>>,
    {
        let mut fill = Fill::default();
        for arg in args {
            match arg.into() {
                Arg::Coord(v) => fill.coords.push(v),
                Arg::Weight(w) => {
                    if fill.weight.replace(w).is_some() {
                        return Err(HistError::DuplicateRole("weight"));
                    }
                }
                Arg::Sample(s) => {
                    if fill.sample.replace(s).is_some() {
                        return Err(HistError::DuplicateRole("sample"));
                    }
                }
            }
        }
        Ok(fill)
    }

    pub fn coords(&self) -> &[Value<'a>] {
        &self.coords
    }

    pub fn get_weight(&self) -> Option<f64> {
        self.weight.map(|w| w.0)
    }

    pub fn get_sample(&self) -> Option<&'a [f64]> {
        self.sample.map(|s| s.0)
    }

    /// Apply the observation's cell update at a storage offset.
    pub(crate) fn apply<S: Storage>(&self, storage: &mut S, index: usize) -> Result<()> {
        match (self.weight, self.sample) {
            (None, None) => storage.increment(index),
            (Some(Weight(w)), None) => storage.add_weight(index, w),
            (None, Some(Sample(x))) => storage.add_sample(index, x),
            (Some(Weight(w)), Some(Sample(x))) => storage.add_weighted_sample(index, w, x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_roles() {
        let f = Fill::new([1.0, 2.0]).weight(3.0).sample(&[4.0]);
        assert_eq!(f.coords(), &[Value::Real(1.0), Value::Real(2.0)]);
        assert_eq!(f.get_weight(), Some(3.0));
        assert_eq!(f.get_sample(), Some(&[4.0][..]));
    }

    #[test]
    fn classify_finds_roles_anywhere() {
        let xs = [5.0, 6.0];
        let f = Fill::classify(vec![
            Arg::from(weight(2.0)),
            Arg::from(1),
            Arg::from("a"),
            Arg::from(sample(&xs)),
        ])
        .unwrap();
        assert_eq!(f.coords(), &[Value::Int(1), Value::Str("a")]);
        assert_eq!(f.get_weight(), Some(2.0));
        assert_eq!(f.get_sample(), Some(&xs[..]));

        let g = Fill::classify(vec![Arg::from(sample(&xs)), Arg::from(0.5), Arg::from(weight(1.0))])
            .unwrap();
        assert_eq!(g.coords(), &[Value::Real(0.5)]);
        assert_eq!(g.get_weight(), Some(1.0));

        let plain = Fill::classify(vec![1, 2, 3]).unwrap();
        assert_eq!(plain, Fill::new([1, 2, 3]));
    }

    #[test]
    fn classify_rejects_duplicates() {
        assert_eq!(
            Fill::classify(vec![Arg::from(weight(1.0)), Arg::from(weight(2.0))]),
            Err(HistError::DuplicateRole("weight"))
        );
        assert_eq!(
            Fill::classify(vec![Arg::from(sample(&[1.0])), Arg::from(sample(&[2.0]))]),
            Err(HistError::DuplicateRole("sample"))
        );
    }

    #[test]
    fn apply_routes_by_role() {
        let mut s = VecStorage::<WeightedMean>::new(2);
        Fill::new([0]).sample(&[2.0]).apply(&mut s, 0).unwrap();
        Fill::new([0]).weight(3.0).sample(&[6.0]).apply(&mut s, 0).unwrap();
        assert_eq!(s[0].sum(), 4.0);
        assert_eq!(s[0].value(), 5.0);
        assert!(Fill::new([0]).apply(&mut s, 1).is_err());
        assert!(Fill::new([0]).weight(1.0).apply(&mut s, 1).is_err());

        let mut w = VecStorage::<WeightedSum>::new(1);
        Fill::new([0]).apply(&mut w, 0).unwrap();
        Fill::new([0]).weight(2.0).apply(&mut w, 0).unwrap();
        assert_eq!(w[0].value(), 3.0);
        assert_eq!(w[0].variance(), 5.0);
    }
}
