// Core logic exports
pub mod pairing;
pub mod parsing;

pub use pairing::{MatchPair, PairingError};
pub use parsing::{parse_age, parse_id, ParseError};
