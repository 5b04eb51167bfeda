#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// One bin per label. Unknown labels go to the overflow slot if the axis
/// has one and are dropped otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Category {
    labels: Vec<String>,
    options: Options,
}

impl Category {
    pub fn new<I, S>(labels: I) -> Result<Category>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Category::with_options(labels, Options::empty())
    }

    pub fn with_options<I, S>(labels: I, options: Options) -> Result<Category>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if options.underflow() || options.circular() {
            return Err(HistError::InvalidAxis(
                "a category axis can only have an overflow slot".into(),
            ));
        }
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        check_size(labels.len())?;
        Ok(Category { labels, options })
    }

    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(String::as_str)
    }
}

impl Axis for Category {
    fn name(&self) -> &'static str {
        "category"
    }

    fn size(&self) -> usize {
        self.labels.len()
    }

    fn options(&self) -> Options {
        self.options
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        let size = self.size() as i32;
        match single(self.name(), coord)? {
            Value::Str(s) => Ok(self
                .labels
                .iter()
                .position(|l| l == s)
                .map_or(size, |i| i as i32)),
            Value::Int(i) if (0..i64::from(size)).contains(&i) => Ok(i as i32),
            Value::Int(_) => Ok(size),
            other => Err(mismatch(self.name(), "str", &other)),
        }
    }
}

#[test]
fn category_bins() {
    let a = Category::new(vec!["A", "B", "C"]).unwrap();
    assert_eq!(a.extent(), 3);
    assert_eq!(a.index(&[Value::Str("B")]).unwrap(), 1);
    assert_eq!(a.index(&[Value::Str("Z")]).unwrap(), 3);
    assert_eq!(a.index(&[Value::Int(2)]).unwrap(), 2);
    assert_eq!(a.index(&[Value::Int(-1)]).unwrap(), 3);
    assert_eq!(a.label(0), Some("A"));
    assert!(a.index(&[Value::Real(1.0)]).is_err());

    let b = Category::with_options(vec!["A"], Options::OVERFLOW).unwrap();
    assert_eq!(b.extent(), 2);
    assert!(Category::with_options(vec!["A"], Options::UNDERFLOW).is_err());
    assert!(Category::new(Vec::<String>::new()).is_err());
}
