mod config;
mod parsers;
mod rangeset;

pub use config::ConfigurationError;
pub use config::Resolver;
pub use config::DEFAULT_EXPAND_LIMIT;
pub use parsers::Parser;
pub use rangeset::RangeSet;
pub use rangeset::RangeSetError;
