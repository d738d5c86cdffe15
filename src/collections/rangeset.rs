use super::parsers::Parser;
use crate::element::{Element, IdRange};
use auto_enums::auto_enum;
use itertools::Itertools;
use log::debug;
use std::convert::Infallible;
use std::fmt;
use thiserror::Error;

/// A canonical set of literals and integer ranges
///
/// Elements are kept sorted (literals first, see [`Element`]), literals are
/// unique and ranges neither overlap nor touch: `1-2,3-4` is always stored as
/// `1-4`. Two sets holding the same members are therefore structurally equal.
///
/// Set operations work on ranges directly and never expand them into
/// individual members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RangeSet {
    elements: Vec<Element>,
}

#[derive(Debug, Error)]
pub enum RangeSetError {
    #[error("range set has {members} members, more than the limit of {limit}")]
    ExpandLimit { members: u64, limit: u64 },
}

impl RangeSet {
    pub fn new() -> Self {
        RangeSet { elements: vec![] }
    }

    /// Returns the elements of the set in canonical order
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Returns whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the number of members in the set, saturating at u64::MAX
    pub fn len(&self) -> u64 {
        self.elements
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.len()))
    }

    /// Adds an element to the set
    ///
    /// A range is merged with every range it touches so that the set stays
    /// canonical. Inserting a literal already in the set does nothing.
    pub fn insert(&mut self, element: Element) {
        let pos = match self.elements.binary_search(&element) {
            Ok(_) => return,
            Err(pos) => pos,
        };

        if element.as_range().is_none() {
            self.elements.insert(pos, element);
            return;
        }

        // Only the left neighbor can touch the new range from below: the
        // ranges before it end at least two ids before it starts.
        let mut merged = false;
        if pos > 0 {
            merged = self.elements[pos - 1].merge(&element);
        }

        let idx = if merged {
            pos - 1
        } else {
            self.elements.insert(pos, element);
            pos
        };

        let mut end = idx + 1;
        while end < self.elements.len() {
            let (head, tail) = self.elements.split_at_mut(end);
            if !head[idx].merge(&tail[0]) {
                break;
            }
            end += 1;
        }
        self.elements.drain(idx + 1..end);
    }

    /// Returns a set with members in either set
    pub fn union(&self, other: &Self) -> Self {
        let mut res = self.clone();
        res.extend(other.elements.iter().cloned());
        res
    }

    /// Returns a set with members in both sets
    pub fn intersection(&self, other: &Self) -> Self {
        // Both operands are disjoint so pairwise intersections are disjoint
        // too, and walking self in order keeps them sorted.
        let elements = self
            .elements
            .iter()
            .cartesian_product(other.elements.iter())
            .filter_map(|(a, b)| a.intersection(b))
            .collect();

        RangeSet { elements }
    }

    /// Returns a set with members of self that are not in other
    pub fn difference(&self, other: &Self) -> Self {
        let mut work = self.elements.clone();
        let mut elements = vec![];
        let mut idx = 0;

        while idx < work.len() {
            let current = work[idx].clone();
            idx += 1;

            let mut a = match current {
                Element::Literal(_) => {
                    if other.elements.binary_search(&current).is_err() {
                        elements.push(current);
                    }
                    continue;
                }
                Element::Range(a) => a,
            };

            // Split pieces rescan other from the start. Ranges already
            // subtracted lie outside the piece, so they never match again.
            let mut vanished = false;
            for b in other.ranges() {
                if b.contains(&a) {
                    vanished = true;
                    break;
                }

                if a.contains(b) {
                    // Both pieces go back to the worklist right after the
                    // current position, lower piece first, and are checked
                    // against the remaining ranges of other.
                    let (below, above) = a.split_around(b);
                    if let Some(above) = above {
                        work.insert(idx, above.into());
                    }
                    if let Some(below) = below {
                        work.insert(idx, below.into());
                    }
                    vanished = true;
                    break;
                }

                if b.contains_id(a.min) {
                    a.min = b.max + 1;
                } else if b.contains_id(a.max) {
                    a.max = b.min - 1;
                }
            }

            if !vanished {
                elements.push(Element::Range(a));
            }
        }

        RangeSet { elements }
    }

    /// Returns a set with members in exactly one of the sets
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }

    /// Returns whether every member of self is also in other
    pub fn is_subset(&self, other: &Self) -> bool {
        self.elements.iter().all(|e| other.covers(e))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Returns whether `member` is in the set
    ///
    /// `member` is classified like a token of a range specification, so a
    /// range such as `2-3` is contained if all of its ids are.
    pub fn contains(&self, member: &str) -> bool {
        self.covers(&Parser::element(member.trim()))
    }

    /// Returns whether a single element of the set covers `element`
    ///
    /// Ranges in a canonical set never touch, so any range covered by the set
    /// lies within one of its ranges.
    fn covers(&self, element: &Element) -> bool {
        match element {
            Element::Literal(_) => self.elements.binary_search(element).is_ok(),
            Element::Range(r) => {
                let idx = self.elements.partition_point(|e| match e {
                    Element::Literal(_) => true,
                    Element::Range(o) => o.min <= r.min,
                });
                idx > 0 && self.elements[idx - 1].covers(element)
            }
        }
    }

    fn ranges(&self) -> impl Iterator<Item = &IdRange> {
        self.elements.iter().filter_map(Element::as_range)
    }

    /// Returns an iterator over the members of the set, in canonical order
    ///
    /// Literals are yielded as is and ranges as each of their ids in
    /// ascending order.
    pub fn iter(&self) -> impl Iterator<Item = String> + '_ {
        self.elements.iter().flat_map(Self::members)
    }

    #[auto_enum(Iterator)]
    fn members(element: &Element) -> impl Iterator<Item = String> {
        match element {
            Element::Literal(text) => std::iter::once(text.clone()),
            Element::Range(r) => r.iter().map(|id| id.to_string()),
        }
    }

    /// Expands the set into its members unless there are more than `limit`
    pub fn try_expand(&self, limit: u64) -> Result<Vec<String>, RangeSetError> {
        let members = self.len();
        if members > limit {
            return Err(RangeSetError::ExpandLimit { members, limit });
        }

        debug!("expanding {} members", members);
        Ok(self.iter().collect())
    }
}

impl FromIterator<Element> for RangeSet {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        let mut set = RangeSet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Element> for RangeSet {
    fn extend<I: IntoIterator<Item = Element>>(&mut self, iter: I) {
        for element in iter {
            self.insert(element);
        }
    }
}

impl std::str::FromStr for RangeSet {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Parser.parse(s))
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.elements.iter().join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(s: &str) -> RangeSet {
        s.parse().unwrap()
    }

    fn validate_union_result(a: &str, b: &str, c: &str) {
        assert_eq!(set(a).union(&set(b)).to_string(), c, "{a} | {b}");
    }

    fn validate_intersection_result(a: &str, b: &str, c: &str) {
        assert_eq!(set(a).intersection(&set(b)).to_string(), c, "{a} & {b}");
    }

    fn validate_difference_result(a: &str, b: &str, c: &str) {
        assert_eq!(set(a).difference(&set(b)).to_string(), c, "{a} - {b}");
    }

    fn assert_canonical(s: &RangeSet) {
        for (a, b) in s.elements.iter().tuple_windows() {
            assert!(a < b, "{a} is not before {b} in {s}");
            if let (Element::Range(a), Element::Range(b)) = (a, b) {
                assert!(a.max + 1 < b.min, "{a} touches {b} in {s}");
            }
        }
    }

    #[test]
    fn test_insert_merges_left_and_right() {
        let mut s = RangeSet::new();
        s.insert(Element::range(1, 2));
        s.insert(Element::range(6, 7));
        s.insert(Element::range(10, 12));
        s.insert(Element::range(20, 20));
        assert_eq!(s.to_string(), "1-2,6-7,10-12,20");

        // Touches the left neighbor and sweeps over two ranges on the right
        s.insert(Element::range(3, 11));
        assert_eq!(s.to_string(), "1-12,20");
        assert_canonical(&s);

        // Fills the gap exactly
        s.insert(Element::range(13, 19));
        assert_eq!(s.to_string(), "1-20");

        s.insert(Element::range(0, 0));
        assert_eq!(s.to_string(), "0-20");

        s.insert(Element::range(5, 5));
        assert_eq!(s.to_string(), "0-20");
    }

    #[test]
    fn test_insert_no_merge() {
        let mut s = RangeSet::new();
        s.insert(Element::range(5, 6));
        s.insert(Element::range(1, 3));
        s.insert(Element::range(8, 9));
        assert_eq!(s.to_string(), "1-3,5-6,8-9");
        assert_canonical(&s);
    }

    #[test]
    fn test_insert_contained_in_right_neighbor() {
        let mut s = RangeSet::new();
        s.insert(Element::range(1, 10));
        s.insert(Element::range(0, 3));
        assert_eq!(s.to_string(), "0-10");

        s.insert(Element::range(0, 12));
        assert_eq!(s.to_string(), "0-12");
    }

    #[test]
    fn test_insert_literals() {
        let mut s = RangeSet::new();
        s.insert(Element::literal("b"));
        s.insert(Element::range(1, 1));
        s.insert(Element::literal("a"));
        s.insert(Element::literal("b"));
        s.insert(Element::range(2, 2));
        assert_eq!(s.to_string(), "a,b,1-2");
        assert_eq!(s.elements().len(), 3);
    }

    #[test]
    fn test_insert_order_independent() {
        let tokens = ["4", "a", "1-2", "9", "3", "b", "7-8", "a", "5"];
        let expected = "a,b,1-5,7-9";

        let forward: RangeSet = tokens.iter().map(|t| Parser::element(t)).collect();
        let backward: RangeSet = tokens.iter().rev().map(|t| Parser::element(t)).collect();

        assert_eq!(forward.to_string(), expected);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_insert_at_bounds() {
        let mut s = RangeSet::new();
        s.insert(Element::range(u64::MAX, u64::MAX));
        s.insert(Element::range(u64::MAX - 2, u64::MAX - 1));
        s.insert(Element::range(0, 0));
        assert_eq!(
            s.to_string(),
            format!("0,{}-{}", u64::MAX - 2, u64::MAX)
        );
        assert_canonical(&s);
    }

    #[test]
    fn test_union() {
        validate_union_result("1", "1", "1");
        validate_union_result("1", "1-2", "1-2");
        validate_union_result("1", "2", "1-2");
        validate_union_result("1", "2-100", "1-100");
        validate_union_result("1", "3", "1,3");
        validate_union_result("1,5", "1-5", "1-5");
        validate_union_result("1-2", "3-4", "1-4");
        validate_union_result("1-2,4-5", "1-5", "1-5");
        validate_union_result("1-3", "2-4", "1-4");
        validate_union_result("1-5", "1-2,4-5", "1-5");
        validate_union_result("3", "1", "1,3");
        validate_union_result("a", "a", "a");
        validate_union_result("a", "b", "a,b");
        validate_union_result("b", "a", "a,b");
        validate_union_result("a,1", "b,1", "a,b,1");
        validate_union_result("a,1", "b,2", "a,b,1-2");
        validate_union_result("b,2", "a,1", "a,b,1-2");
        validate_union_result("", "", "");
    }

    #[test]
    fn test_intersection() {
        validate_intersection_result("1", "1", "1");
        validate_intersection_result("1", "1-2", "1");
        validate_intersection_result("1", "2", "");
        validate_intersection_result("1", "2-100", "");
        validate_intersection_result("1,5", "1-5", "1,5");
        validate_intersection_result("1-2", "2", "2");
        validate_intersection_result("1-2,4-5", "1-5", "1-2,4-5");
        validate_intersection_result("1-3", "2-4", "2-3");
        validate_intersection_result("1-5", "1-2,4-5", "1-2,4-5");
        validate_intersection_result("2-4", "1-3", "2-3");
        validate_intersection_result("2-100", "1", "");
        validate_intersection_result("a", "a", "a");
        validate_intersection_result("a", "b", "");
        validate_intersection_result("a,1", "b,1", "1");
        validate_intersection_result("b,2", "a,1", "");
        validate_intersection_result("1-3,a,2-5", "1-5,b", "1-5");
        validate_intersection_result("1-10,20-30", "5-25,a", "5-10,20-25");
    }

    #[test]
    fn test_difference() {
        validate_difference_result("1", "1", "");
        validate_difference_result("1", "1-2", "");
        validate_difference_result("1", "2", "1");
        validate_difference_result("1,5", "1-5", "");
        validate_difference_result("1-2", "1", "2");
        validate_difference_result("1-2", "2", "1");
        validate_difference_result("1-2,4-5", "1-5", "");
        validate_difference_result("1-3", "2-4", "1");
        validate_difference_result("1-5", "1,5", "2-4");
        validate_difference_result("1-5", "1-2,4-5", "3");
        validate_difference_result("1-6", "1,3,6", "2,4-5");
        validate_difference_result("1-6", "1,4", "2-3,5-6");
        validate_difference_result("1-6", "1,6", "2-5");
        validate_difference_result("1-6", "2,4", "1,3,5-6");
        validate_difference_result("1-6", "2-5", "1,6");
        validate_difference_result("2-100", "1", "2-100");
        validate_difference_result("2-4", "1-3", "4");
        validate_difference_result("a", "a", "");
        validate_difference_result("a", "b", "a");
        validate_difference_result("a,1", "b,1", "a");
        validate_difference_result("a,1", "b,2", "a,1");
        validate_difference_result("b,1", "a,1", "b");
        validate_difference_result("1-20", "2,4-5,7,9-18", "1,3,6,8,19-20");
    }

    #[test]
    fn test_difference_at_bounds() {
        let full = RangeSet::from_iter([Element::range(0, u64::MAX)]);
        let ends = RangeSet::from_iter([
            Element::range(0, 0),
            Element::range(u64::MAX, u64::MAX),
        ]);

        let inner = full.difference(&ends);
        assert_eq!(inner.elements(), &[Element::range(1, u64::MAX - 1)]);
        assert!(full.difference(&full).is_empty());
        assert_eq!(inner.union(&ends), full);
    }

    #[test]
    fn test_symmetric_difference() {
        assert_eq!(set("1-5").symmetric_difference(&set("3-6")).to_string(), "1-2,6");
        assert_eq!(set("a,b,1").symmetric_difference(&set("b,c")).to_string(), "a,c,1");
        assert!(set("1-3,x").symmetric_difference(&set("x,3,1-2")).is_empty());
    }

    #[test]
    fn test_subset() {
        assert!(set("").is_subset(&set("")));
        assert!(set("").is_subset(&set("1")));
        assert!(!set("1").is_subset(&set("")));
        assert!(set("1").is_subset(&set("1-3")));
        assert!(set("2-3").is_subset(&set("1-3")));
        assert!(!set("3-4").is_subset(&set("1-3")));
        assert!(!set("0-1").is_subset(&set("1-3")));
        assert!(!set("1-3").is_subset(&set("1")));
        assert!(set("1-3,a,2-5").is_subset(&set("1-5,a")));
        assert!(!set("1-3,a,2-5").is_subset(&set("1-5,b")));
        assert!(set("1-5,a").is_subset(&set("1-3,a,2-5")));
        assert!(!set("a").is_subset(&set("1")));
        assert!(!set("1").is_subset(&set("a")));
        assert!(set("2,8").is_subset(&set("a,1-3,7-9")));
        assert!(!set("2-8").is_subset(&set("a,1-3,7-9")));
        assert!(set("1-3").is_superset(&set("2")));
    }

    #[test]
    fn test_equal() {
        assert_eq!(set("1-2,3,4-5"), set("1-5"));
        assert_eq!(set("b,a,1"), set("1,a,b"));
        assert_ne!(set("1,5"), set("1-5"));
        assert_ne!(set("1-2,4-5"), set("1-5"));
        assert_ne!(set("a"), set("b"));
    }

    #[test]
    fn test_contains() {
        let s = set("a,1-3,7");
        assert!(s.contains("a"));
        assert!(s.contains("2"));
        assert!(s.contains(" 7 "));
        assert!(s.contains("1-3"));
        assert!(!s.contains("3-7"));
        assert!(!s.contains("b"));
        assert!(!s.contains("02"));
    }

    #[test]
    fn test_iter() {
        assert_eq!(
            set("c,1-3,d").iter().collect::<Vec<_>>(),
            vec!["c", "d", "1", "2", "3"]
        );
        assert_eq!(set("00-02").iter().collect::<Vec<_>>(), vec!["00-02"]);
        assert_eq!(set(",,").iter().count(), 0);
    }

    #[test]
    fn test_len() {
        assert_eq!(set("").len(), 0);
        assert_eq!(set("a,b,1-3,10").len(), 6);
        assert_eq!(set("0-18446744073709551615,a").len(), u64::MAX);
    }

    #[test]
    fn test_try_expand() {
        assert_eq!(set("1-3").try_expand(3).unwrap(), vec!["1", "2", "3"]);
        match set("1-3,a").try_expand(3) {
            Err(RangeSetError::ExpandLimit {
                members: 4,
                limit: 3,
            }) => (),
            r => panic!("Expected ExpandLimit error, got {r:?}"),
        }
    }
}
