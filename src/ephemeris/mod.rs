pub mod epoch;
mod lookup;
mod parser;
mod types;

pub use lookup::{find_exact, find_nearest};
pub use parser::{parse_oem, ParseError};
pub use types::{EphemerisSnapshot, FieldMap, StateVector};

#[cfg(test)]
pub(crate) use lookup::tests::hourly_vectors;
