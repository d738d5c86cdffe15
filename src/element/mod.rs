mod range;

pub use range::IdRange;

use std::fmt;

/// A member of a range set: either an opaque literal token or an inclusive
/// range of integers
///
/// Elements are totally ordered: all literals sort before all ranges,
/// literals are compared bytewise and ranges by `(min, max)`. A canonical
/// `RangeSet` keeps its elements in this order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum Element {
    Literal(String),
    Range(IdRange),
}

impl Element {
    pub fn literal(text: impl Into<String>) -> Self {
        Element::Literal(text.into())
    }

    pub fn range(a: u64, b: u64) -> Self {
        Element::Range(IdRange::new(a, b))
    }

    pub fn as_range(&self) -> Option<&IdRange> {
        match self {
            Element::Range(r) => Some(r),
            Element::Literal(_) => None,
        }
    }

    /// Returns the number of members the element expands to
    pub fn len(&self) -> u64 {
        match self {
            Element::Literal(_) => 1,
            Element::Range(r) => r.len(),
        }
    }

    /// Merges `other` into this element if their union is a single element
    ///
    /// Returns whether the merge happened. Literals only merge with an
    /// identical literal, ranges with any range they touch.
    pub(crate) fn merge(&mut self, other: &Element) -> bool {
        match (self, other) {
            (Element::Literal(a), Element::Literal(b)) => a == b,
            (Element::Range(a), Element::Range(b)) if a.touches(b) => {
                a.absorb(b);
                true
            }
            _ => false,
        }
    }

    /// Returns the members shared by both elements as a single element
    pub(crate) fn intersection(&self, other: &Element) -> Option<Element> {
        match (self, other) {
            (Element::Literal(a), Element::Literal(b)) if a == b => Some(self.clone()),
            (Element::Range(a), Element::Range(b)) => a.intersection(b).map(Element::Range),
            _ => None,
        }
    }

    /// Returns whether every member of `other` is a member of this element
    pub(crate) fn covers(&self, other: &Element) -> bool {
        match (self, other) {
            (Element::Literal(a), Element::Literal(b)) => a == b,
            (Element::Range(a), Element::Range(b)) => a.contains(b),
            _ => false,
        }
    }
}

impl From<IdRange> for Element {
    fn from(range: IdRange) -> Self {
        Element::Range(range)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Element::Literal(text) => f.write_str(text),
            Element::Range(r) => r.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_order() {
        let mut elements = vec![
            Element::range(3, 4),
            Element::literal("b"),
            Element::range(1, 5),
            Element::range(1, 2),
            Element::literal("a"),
            Element::literal("B"),
        ];
        elements.sort();

        assert_eq!(
            elements,
            vec![
                Element::literal("B"),
                Element::literal("a"),
                Element::literal("b"),
                Element::range(1, 2),
                Element::range(1, 5),
                Element::range(3, 4),
            ]
        );
    }

    #[test]
    fn test_element_merge() {
        let mut e = Element::range(1, 2);
        assert!(e.merge(&Element::range(3, 4)));
        assert_eq!(e, Element::range(1, 4));

        assert!(!e.merge(&Element::range(6, 7)));
        assert_eq!(e, Element::range(1, 4));

        assert!(!e.merge(&Element::literal("1")));

        let mut l = Element::literal("a");
        assert!(l.merge(&Element::literal("a")));
        assert!(!l.merge(&Element::literal("b")));
    }

    #[test]
    fn test_element_intersection() {
        assert_eq!(
            Element::range(1, 3).intersection(&Element::range(2, 5)),
            Some(Element::range(2, 3))
        );
        assert_eq!(
            Element::literal("a").intersection(&Element::literal("a")),
            Some(Element::literal("a"))
        );
        assert_eq!(
            Element::literal("a").intersection(&Element::literal("b")),
            None
        );
        assert_eq!(Element::literal("1").intersection(&Element::range(1, 1)), None);
    }

    #[test]
    fn test_element_display() {
        assert_eq!(Element::literal("1 1").to_string(), "1 1");
        assert_eq!(Element::range(2, 2).to_string(), "2");
        assert_eq!(Element::range(5, 1).to_string(), "1-5");
    }
}
