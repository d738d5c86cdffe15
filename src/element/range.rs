use std::fmt::{self, Display};

/// An inclusive interval of non-negative integers
///
/// `min <= max` always holds. A single integer `n` is the interval `n-n`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct IdRange {
    pub(crate) min: u64,
    pub(crate) max: u64,
}

impl IdRange {
    /// Creates a range from two bounds given in any order
    pub fn new(a: u64, b: u64) -> Self {
        IdRange {
            min: u64::min(a, b),
            max: u64::max(a, b),
        }
    }

    pub fn single(id: u64) -> Self {
        IdRange { min: id, max: id }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    /// Returns the number of integers in the range, saturating at u64::MAX
    pub fn len(&self) -> u64 {
        (self.max - self.min).saturating_add(1)
    }

    pub fn contains_id(&self, id: u64) -> bool {
        self.min <= id && id <= self.max
    }

    /// Returns whether `other` lies entirely within this range
    pub fn contains(&self, other: &Self) -> bool {
        self.min <= other.min && other.max <= self.max
    }

    /// Returns whether both ranges overlap or are adjacent, meaning that their
    /// union is itself a range
    pub fn touches(&self, other: &Self) -> bool {
        self.min <= other.max.saturating_add(1) && other.min <= self.max.saturating_add(1)
    }

    /// Extends this range to cover `other`
    ///
    /// Only meaningful when both ranges touch.
    pub(crate) fn absorb(&mut self, other: &Self) {
        self.min = u64::min(self.min, other.min);
        self.max = u64::max(self.max, other.max);
    }

    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let min = u64::max(self.min, other.min);
        let max = u64::min(self.max, other.max);

        (min <= max).then_some(IdRange { min, max })
    }

    /// Returns the pieces of this range lying below and above `other`
    ///
    /// `other` must be contained in this range.
    pub(crate) fn split_around(&self, other: &Self) -> (Option<Self>, Option<Self>) {
        debug_assert!(self.contains(other));

        let below = (self.min < other.min).then(|| IdRange {
            min: self.min,
            max: other.min - 1,
        });
        let above = (other.max < self.max).then(|| IdRange {
            min: other.max + 1,
            max: self.max,
        });

        (below, above)
    }

    /// Returns an iterator over the integers in the range
    pub fn iter(&self) -> std::ops::RangeInclusive<u64> {
        self.min..=self.max
    }
}

impl From<u64> for IdRange {
    fn from(id: u64) -> Self {
        IdRange::single(id)
    }
}

impl Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}
