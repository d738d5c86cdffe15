#![doc = include_str!("../README.md")]
mod collections;
mod element;

pub use collections::ConfigurationError;
pub use collections::Parser;
pub use collections::RangeSet;
pub use collections::RangeSetError;
pub use collections::Resolver;
pub use collections::DEFAULT_EXPAND_LIMIT;
pub use element::Element;
pub use element::IdRange;

/// Parses a range specification into a canonical range set
pub fn parse(text: &str) -> RangeSet {
    Parser.parse(text)
}

/// Returns the canonical form of a range specification
///
/// ```
/// assert_eq!(rangespec::normalize("3,2,1,b,a"), "a,b,1-3");
/// ```
pub fn normalize(text: &str) -> String {
    parse(text).to_string()
}

/// Returns the canonical union of two range specifications
pub fn union(a: &str, b: &str) -> String {
    parse(a).union(&parse(b)).to_string()
}

/// Returns the canonical intersection of two range specifications
pub fn intersection(a: &str, b: &str) -> String {
    parse(a).intersection(&parse(b)).to_string()
}

/// Returns the canonical specification of members of `a` that are not in `b`
///
/// ```
/// assert_eq!(rangespec::difference("1-6", "2,4"), "1,3,5-6");
/// ```
pub fn difference(a: &str, b: &str) -> String {
    parse(a).difference(&parse(b)).to_string()
}

/// Returns whether every member of `a` is a member of `b`
pub fn subset(a: &str, b: &str) -> bool {
    parse(a).is_subset(&parse(b))
}

/// Returns whether both specifications describe the same set
pub fn equal(a: &str, b: &str) -> bool {
    parse(a) == parse(b)
}

/// Expands a range specification into its members
///
/// Literals come first, followed by the ids of each range in ascending order.
/// Callers are responsible for bounding the width of ranges beforehand, see
/// [`RangeSet::try_expand`].
///
/// ```
/// assert_eq!(rangespec::expand("c,1-3,d"), vec!["c", "d", "1", "2", "3"]);
/// ```
pub fn expand(text: &str) -> Vec<String> {
    parse(text).iter().collect()
}
