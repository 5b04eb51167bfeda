use std::fmt::{self, Debug};

#[cfg(feature = "serde")]
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use super::*;

/// A multi-dimensional histogram: a set of axes and one storage cell per
/// combination of axis slots.
///
/// ```
/// use histoire::{coords, Histogram, Regular};
///
/// let axes = vec![Regular::new(4, 0.0, 1.0).unwrap()];
/// let mut h = Histogram::new(axes).unwrap();
/// h.fill(&coords![0.3]).unwrap();
/// h.fill(&coords![7.0]).unwrap();
/// assert_eq!(h.at(&[1]).unwrap(), 1u64);
/// assert_eq!(h.at(&[4]).unwrap(), 1u64);
/// ```
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Histogram<A, S = AdaptiveStorage> {
    axes: A,
    storage: S,
}

impl<A: Debug, S: Debug> Debug for Histogram<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Histogram[")?;
        let line = format!("axes: {:?}, storage: {:?}", self.axes, self.storage);
        f.write_str(&*line)?;
        f.write_str("]")
    }
}

impl<A: Axes> Histogram<A> {
    /// A counting histogram over `axes`.
    pub fn new(axes: A) -> Result<Histogram<A>> {
        Histogram::with_storage(axes, AdaptiveStorage::default())
    }
}

impl<A: Axes, S: Storage> Histogram<A, S> {
    /// Build over `axes`, resizing `storage` to one zeroed cell per bin.
    pub fn with_storage(axes: A, mut storage: S) -> Result<Histogram<A, S>> {
        if axes.rank() == 0 {
            return Err(HistError::NoAxes);
        }
        let cells = axes.bincount()?;
        storage.reset(cells)?;
        log::debug!("histogram of rank {} with {} cells", axes.rank(), cells);
        Ok(Histogram { axes, storage })
    }

    /// Reassemble from parts, keeping the storage's contents.
    pub fn from_parts(axes: A, storage: S) -> Result<Histogram<A, S>> {
        if axes.rank() == 0 {
            return Err(HistError::NoAxes);
        }
        let expected = axes.bincount()?;
        if storage.len() != expected {
            return Err(HistError::StorageSize {
                cells: storage.len(),
                expected,
            });
        }
        Ok(Histogram { axes, storage })
    }

    /// Split into axes and storage.
    pub fn into_parts(self) -> (A, S) {
        (self.axes, self.storage)
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.axes.rank()
    }

    /// Total number of cells, flow slots included.
    pub fn size(&self) -> usize {
        self.storage.len()
    }

    /// The `i`th axis, if there is one.
    pub fn axis(&self, i: usize) -> Option<&dyn Axis> {
        self.axes.axis(i)
    }

    /// All axes.
    pub fn axes(&self) -> &A {
        &self.axes
    }

    /// The cell storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Count one observation. Coordinates outside every bin are dropped
    /// without error.
    pub fn fill(&mut self, coords: &[Value<'_>]) -> Result<()> {
        if let Some(i) = index_of_coords(&self.axes, coords)?.get() {
            self.storage.increment(i)?;
        }
        Ok(())
    }

    /// Fill one observation that may carry a weight and a sample.
    pub fn fill_with(&mut self, fill: &Fill<'_>) -> Result<()> {
        if let Some(i) = index_of_coords(&self.axes, fill.coords())?.get() {
            fill.apply(&mut self.storage, i)?;
        }
        Ok(())
    }

    /// The cell at the given per-axis bin ids. `-1` and `size` address the
    /// underflow and overflow slots of axes that have them.
    pub fn at(&self, bins: &[i32]) -> Result<S::Value> {
        let i = index_of_bins(&self.axes, bins)?;
        Ok(self.storage.get(i))
    }

    /// The cell at a flat storage offset.
    pub fn get(&self, index: usize) -> Option<S::Value> {
        if index < self.storage.len() {
            Some(self.storage.get(index))
        } else {
            None
        }
    }

    /// Zero every cell.
    pub fn reset(&mut self) -> Result<()> {
        let cells = self.axes.bincount()?;
        self.storage.reset(cells)
    }

    /// Multiply every cell by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.storage.scale(factor);
    }

    /// Add `other` cell by cell. Both histograms must have equal axes.
    pub fn merge(&mut self, other: &Histogram<A, S>) -> Result<()>
    where
        A: PartialEq,
    {
        if self.axes != other.axes {
            return Err(HistError::AxesMismatch);
        }
        self.storage.merge(&other.storage)
    }
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct Parts<A, S> {
    axes: A,
    storage: S,
}

#[cfg(feature = "serde")]
impl<'de, A, S> Deserialize<'de> for Histogram<A, S>
where
    A: Axes + Deserialize<'de>,
    S: Storage + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let parts = Parts::<A, S>::deserialize(deserializer)?;
        Histogram::from_parts(parts.axes, parts.storage).map_err(D::Error::custom)
    }
}

#[cfg(test)]
fn grid() -> Vec<Integer> {
    vec![
        Integer::with_options(0, 3, Options::empty()).unwrap(),
        Integer::with_options(0, 4, Options::empty()).unwrap(),
    ]
}

#[test]
fn fill_1d() {
    let mut h = Histogram::new(vec![Integer::new(0, 3).unwrap()]).unwrap();
    assert_eq!(h.rank(), 1);
    assert_eq!(h.size(), 5);
    for i in [-5, -1, 0, 1, 1, 2, 3, 10] {
        h.fill(&coords![i]).unwrap();
    }
    assert_eq!(h.at(&[-1]).unwrap(), 2u64);
    assert_eq!(h.at(&[0]).unwrap(), 1u64);
    assert_eq!(h.at(&[1]).unwrap(), 2u64);
    assert_eq!(h.at(&[2]).unwrap(), 1u64);
    assert_eq!(h.at(&[3]).unwrap(), 2u64);
    assert_eq!(h.storage().sum(), 8u64);
    assert_eq!(
        h.at(&[4]),
        Err(HistError::IndexOutOfRange {
            axis: 0,
            index: 4,
            size: 3
        })
    );
    assert_eq!(
        h.fill(&coords![1, 2]),
        Err(HistError::ArgumentType {
            axis: "integer",
            expected: "a single value",
            found: "a tuple"
        })
    );
    assert_eq!(h.storage().sum(), 8u64);
}

#[test]
fn growth() {
    let mut h = Histogram::new(vec![Integer::new(0, 2).unwrap()]).unwrap();
    for _ in 0..255 {
        h.fill(&coords![0]).unwrap();
    }
    assert_eq!(h.storage().repr(), Repr::U8);
    h.fill(&coords![0]).unwrap();
    assert_eq!(h.storage().repr(), Repr::U16);
    assert_eq!(h.at(&[0]).unwrap(), 256u64);
    h.fill_with(&Fill::new([1]).weight(0.5)).unwrap();
    assert_eq!(h.storage().repr(), Repr::F64);
    assert_eq!(h.at(&[0]).unwrap(), 256.0);
    assert_eq!(h.at(&[1]).unwrap(), 0.5);
}

#[test]
fn fill_2d() {
    let axes = vec![
        Integer::new(-1, 2).unwrap(),
        Integer::with_options(-2, 1, Options::OVERFLOW).unwrap(),
    ];
    let mut h = Histogram::new(axes).unwrap();
    assert_eq!(h.size(), 5 * 4);
    let points = [(-1, -2), (-1, -1), (0, 0), (0, -1), (1, 0), (3, -1), (0, -3), (0, 0)];
    for (x, y) in points.iter() {
        h.fill(&coords![*x, *y]).unwrap();
    }
    // rows are the second axis; its underflow does not exist so (0, -3)
    // was dropped
    let expected = [
        [1, 0, 0, 0, 0],
        [1, 1, 0, 1, 0],
        [0, 2, 1, 0, 0],
        [0, 0, 0, 0, 0],
    ];
    for (j, row) in expected.iter().enumerate() {
        for (i, n) in row.iter().enumerate() {
            let bins = [i as i32, j as i32];
            let bins = if i == 4 { [-1, bins[1]] } else { bins };
            assert_eq!(h.at(&bins).unwrap(), *n as u64, "bin {:?}", bins);
        }
    }
    assert_eq!(h.storage().sum(), 7u64);
}

#[test]
fn linearization_wraparound() {
    let mut h = Histogram::new(grid()).unwrap();
    assert_eq!(h.size(), 12);
    for (x, y) in [(0, 0), (2, 3), (1, 2)].iter() {
        h.fill(&coords![*x, *y]).unwrap();
    }
    for i in 0..3 {
        for j in 0..4 {
            let expected = matches!((i, j), (0, 0) | (2, 3) | (1, 2)) as u64;
            assert_eq!(h.at(&[i, j]).unwrap(), expected);
        }
    }
    assert_eq!(h.storage().sum(), 3u64);
    assert_eq!(h.get(2 + 3 * 3), Some(Count::Int(1)));
    assert_eq!(h.get(12), None);
}

#[test]
fn invalid_index_poisons_fill() {
    let mut h = Histogram::new(grid()).unwrap();
    h.fill(&coords![1, 9]).unwrap();
    h.fill(&coords![-1, 0]).unwrap();
    assert_eq!(h.storage().sum(), 0u64);
    assert_eq!(
        h.fill(&coords![1]),
        Err(HistError::ArgumentCount { got: 1, rank: 2 })
    );
}

#[test]
fn add_2d() {
    let mut a = Histogram::new(grid()).unwrap();
    let mut b = Histogram::new(grid()).unwrap();
    a.fill(&coords![0, 1]).unwrap();
    b.fill(&coords![0, 1]).unwrap();
    b.fill(&coords![2, 2]).unwrap();
    a.merge(&b).unwrap();
    assert_eq!(a.at(&[0, 1]).unwrap(), 2u64);
    assert_eq!(a.at(&[2, 2]).unwrap(), 1u64);

    a.scale(2.0);
    assert_eq!(a.at(&[0, 1]).unwrap(), 4u64);
    assert_eq!(a.storage().repr(), Repr::U8);

    let other = Histogram::new(vec![Integer::new(0, 3).unwrap(), Integer::new(0, 4).unwrap()]);
    assert_eq!(a.merge(&other.unwrap()), Err(HistError::AxesMismatch));

    assert_ne!(a, b);
    a.reset().unwrap();
    assert_eq!(a, Histogram::new(grid()).unwrap());
}

#[test]
fn weighted_and_sampled_cells() {
    use approx::assert_relative_eq;

    let axes = [Regular::new(2, 0.0, 2.0).unwrap()];
    let mut h = Histogram::with_storage(axes, VecStorage::<Mean>::default()).unwrap();
    for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
        h.fill_with(&Fill::new([0.5]).sample(&[x])).unwrap();
    }
    h.fill_with(&Fill::new([5.0]).sample(&[1.0])).unwrap();
    let m = h.at(&[0]).unwrap();
    assert_eq!(m.count(), 8.0);
    assert_relative_eq!(m.value(), 5.0, max_relative = 1e-12);
    assert_relative_eq!(m.population_variance(), 4.0, max_relative = 1e-12);
    assert_eq!(h.at(&[2]).unwrap().count(), 1.0);
    assert!(matches!(
        h.fill(&coords![0.5]),
        Err(HistError::UnsupportedRole { .. })
    ));

    let mut w = Histogram::with_storage(
        vec![Integer::new(0, 2).unwrap()],
        VecStorage::<WeightedSum>::default(),
    )
    .unwrap();
    w.fill_with(&Fill::new([1]).weight(2.0)).unwrap();
    w.fill_with(&Fill::new([1]).weight(3.0)).unwrap();
    w.fill(&coords![1]).unwrap();
    assert_eq!(w.at(&[1]).unwrap(), WeightedSum::new(6.0, 14.0));
}

#[test]
fn fixed_capacity_storage() {
    let too_big = Histogram::with_storage(grid(), ArrayStorage::<f64, 8>::default());
    assert_eq!(
        too_big,
        Err(HistError::Capacity {
            requested: 12,
            capacity: 8
        })
    );
    let mut h = Histogram::with_storage(grid(), ArrayStorage::<f64, 16>::default()).unwrap();
    h.fill(&coords![2, 3]).unwrap();
    assert_eq!(h.at(&[2, 3]), Ok(1.0));
}

#[test]
fn rank_one_axis_sees_the_whole_tuple() {
    // bins points in the plane by distance from the origin
    #[derive(Debug)]
    struct Radius;

    impl Axis for Radius {
        fn name(&self) -> &'static str {
            "radius"
        }

        fn size(&self) -> usize {
            3
        }

        fn options(&self) -> Options {
            Options::OVERFLOW
        }

        fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
            match coord {
                [Value::Real(x), Value::Real(y)] => Ok((x.hypot(*y) as i32).min(3)),
                _ => Err(HistError::ArgumentType {
                    axis: self.name(),
                    expected: "(f64, f64)",
                    found: "something else",
                }),
            }
        }
    }

    let axes: Vec<Box<dyn Axis>> = vec![Box::new(Radius)];
    let mut h = Histogram::new(axes).unwrap();
    h.fill(&coords![0.3, 0.4]).unwrap();
    h.fill(&coords![1.5, 2.0]).unwrap();
    h.fill(&coords![30.0, 40.0]).unwrap();
    assert_eq!(h.at(&[0]).unwrap(), 1u64);
    assert_eq!(h.at(&[2]).unwrap(), 1u64);
    assert_eq!(h.at(&[3]).unwrap(), 1u64);
    assert!(h.fill(&coords![1.0]).is_err());
}

#[test]
fn heterogeneous_axes() {
    let axes = vec![
        AnyAxis::from(Category::new(vec!["red", "green"]).unwrap()),
        AnyAxis::from(Regular::new(2, 0.0, 1.0).unwrap()),
    ];
    let mut h = Histogram::new(axes).unwrap();
    assert_eq!(h.axis(0).map(|a| a.name()), Some("category"));
    assert!(h.axis(2).is_none());
    h.fill(&coords!["green", 0.75]).unwrap();
    h.fill(&coords!["blue", 0.75]).unwrap();
    assert_eq!(h.at(&[1, 1]).unwrap(), 1u64);
    assert_eq!(h.storage().sum(), 1u64);
    assert!(h.fill(&coords![0.2, 0.75]).is_err());
    assert_eq!(
        Histogram::new(Vec::<AnyAxis>::new()),
        Err(HistError::NoAxes)
    );
}

#[test]
fn too_many_cells() {
    let wide = || Integer::with_options(0, 1 << 16, Options::empty()).unwrap();
    let too_many = HistError::InvalidAxis("too many cells".into());
    let axes = vec![wide(), wide(), wide(), wide()];
    assert_eq!(Histogram::new(axes.clone()), Err(too_many.clone()));
    assert_eq!(
        Histogram::with_storage(axes.clone(), VecStorage::<f64>::default()),
        Err(too_many.clone())
    );
    assert_eq!(
        Histogram::from_parts(axes, AdaptiveStorage::new(0)),
        Err(too_many)
    );
}

#[test]
fn parts_must_agree() {
    let h = Histogram::new(grid()).unwrap();
    let (axes, storage) = h.clone().into_parts();
    assert_eq!(Histogram::from_parts(axes, storage).unwrap(), h);
    assert_eq!(
        Histogram::from_parts(grid(), AdaptiveStorage::new(11)),
        Err(HistError::StorageSize {
            cells: 11,
            expected: 12
        })
    );
}

#[cfg(feature = "serde")]
#[test]
fn serde_roundtrip() {
    let mut h = Histogram::new(vec![Integer::new(0, 3).unwrap()]).unwrap();
    for _ in 0..300 {
        h.fill(&coords![1]).unwrap();
    }
    h.fill(&coords![2]).unwrap();
    let json = serde_json::to_string(&h).unwrap();
    let back: Histogram<Vec<Integer>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, h);
    assert_eq!(back.storage().repr(), Repr::U16);

    let mut bad = serde_json::to_value(&h).unwrap();
    bad["storage"] = serde_json::json!([0, 1]);
    assert!(serde_json::from_value::<Histogram<Vec<Integer>>>(bad).is_err());
}
