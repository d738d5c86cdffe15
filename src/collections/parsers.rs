use super::RangeSet;
use crate::element::{Element, IdRange};
use log::{debug, trace};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{digit0, one_of},
    combinator::{all_consuming, map, map_res, recognize},
    sequence::{delimited, pair, separated_pair},
    IResult,
};

/// Parse range specifications into range sets
///
/// A range specification is a comma-separated list of tokens. Each token is
/// trimmed and empty tokens are ignored. A token made of a single integer
/// (`7`) or of two integers separated by a dash (`1-5`, `5 - 1`) is a range;
/// anything else is kept verbatim as a literal. Integers may not have leading
/// zeros and must fit in a u64: `00-02` is a literal.
#[derive(Debug, Copy, Clone, Default)]
pub struct Parser;

impl Parser {
    /// Parse a string into a canonical range set
    pub fn parse(self, i: &str) -> RangeSet {
        let mut set = RangeSet::new();

        for token in Self::tokens(i) {
            set.insert(Self::element(token));
        }

        debug!("parsed {:?} into {} elements", i, set.elements().len());
        set
    }

    /// Splits a range specification into trimmed, non-empty tokens
    pub fn tokens(i: &str) -> impl Iterator<Item = &str> {
        i.split(',').map(str::trim).filter(|token| !token.is_empty())
    }

    /// Classifies a single token
    pub fn element(token: &str) -> Element {
        let element = match all_consuming(Self::id_range)(token) {
            Ok((_, range)) => Element::Range(range),
            Err(_) => Element::Literal(token.to_string()),
        };

        trace!("token {:?} classified as {:?}", token, element);
        element
    }

    fn id_range(i: &str) -> IResult<&str, IdRange> {
        alt((
            map(
                separated_pair(
                    Self::id,
                    delimited(Self::blank, tag("-"), Self::blank),
                    Self::id,
                ),
                |(a, b)| IdRange::new(a, b),
            ),
            map(Self::id, IdRange::single),
        ))(i)
    }

    fn id(i: &str) -> IResult<&str, u64> {
        map_res(
            alt((recognize(pair(one_of("123456789"), digit0)), tag("0"))),
            |digits: &str| digits.parse::<u64>(),
        )(i)
    }

    fn blank(i: &str) -> IResult<&str, &str> {
        take_while(char::is_whitespace)(i)
    }
}
