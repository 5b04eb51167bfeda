#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::*;

/// A tagged union over the built-in axis kinds, for axis sets whose
/// members are only known at runtime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnyAxis {
    Regular(Regular),
    Integer(Integer),
    Category(Category),
}

impl AnyAxis {
    /// Call `f` with the concrete axis behind the tag.
    pub fn visit<R>(&self, f: impl FnOnce(&dyn Axis) -> R) -> R {
        match self {
            AnyAxis::Regular(a) => f(a as &dyn Axis),
            AnyAxis::Integer(a) => f(a as &dyn Axis),
            AnyAxis::Category(a) => f(a as &dyn Axis),
        }
    }
}

impl Axis for AnyAxis {
    fn name(&self) -> &'static str {
        self.visit(|a| a.name())
    }

    fn size(&self) -> usize {
        self.visit(|a| a.size())
    }

    fn options(&self) -> Options {
        self.visit(|a| a.options())
    }

    fn extent(&self) -> usize {
        self.visit(|a| a.extent())
    }

    fn index(&self, coord: &[Value<'_>]) -> Result<i32> {
        self.visit(|a| a.index(coord))
    }
}

impl From<Regular> for AnyAxis {
    fn from(a: Regular) -> Self {
        AnyAxis::Regular(a)
    }
}

impl From<Integer> for AnyAxis {
    fn from(a: Integer) -> Self {
        AnyAxis::Integer(a)
    }
}

impl From<Category> for AnyAxis {
    fn from(a: Category) -> Self {
        AnyAxis::Category(a)
    }
}

#[test]
fn visit_dispatches() {
    let axes: Vec<AnyAxis> = vec![
        Integer::new(0, 3).unwrap().into(),
        Regular::new(4, -2.0, 2.0).unwrap().into(),
        Category::new(vec!["x", "y"]).unwrap().into(),
    ];
    let names: Vec<&str> = axes.iter().map(|a| a.name()).collect();
    assert_eq!(names, ["integer", "regular", "category"]);
    assert_eq!(axes[1].index(&[Value::Real(0.5)]).unwrap(), 2);
    assert_eq!(axes[2].index(&[Value::Str("y")]).unwrap(), 1);
    assert_eq!(axes.bincount(), Ok(5 * 6 * 2));
}
