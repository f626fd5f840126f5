//! Rune identifiers and the base-26 name bijection (spec §3, §4.B).

use std::fmt;
use std::str::FromStr;

use bitcoin::Network;

/// Bitcoin's subsidy halving interval, in blocks. The rune-name minimum
/// length schedule and the network activation heights are both expressed
/// in multiples of this constant.
const SUBSIDY_HALVING_INTERVAL: u32 = 210_000;

/// Blocks between each one-letter reduction of the minimum etchable name
/// length (spec §4.B: "decreasing one letter per ≈17,500 blocks").
const MINIMUM_NAME_STEP: u32 = SUBSIDY_HALVING_INTERVAL / 12;

/// Name length at activation, and the length the schedule stops shrinking
/// past (spec §4.B, §3: 1–28 letters, 13 at activation).
const MAXIMUM_MINIMUM_LENGTH: usize = 13;

/// Longest name a rune may have.
pub const MAX_NAME_LENGTH: usize = 28;

/// A non-negative 128-bit rune identifier, displayed as an uppercase
/// base-26 string (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rune(pub u128);

/// Name length at which the reserved range begins. Chosen independently of
/// [`MAX_NAME_LENGTH`]: under the bijective base-26 numbering, the smallest
/// rune with a 28-letter name does not fit in a u128 (`sum(26^i, i=1..28)`
/// overflows), so the reserved boundary has to sit below that. 27 keeps
/// every reachable value inside `u128` with headroom; names long enough to
/// cross it are simply unetchable, which matches the protocol's observed
/// behavior that very long names fall into reserved territory.
const RESERVED_BOUNDARY_LENGTH: usize = 27;

impl Rune {
    /// First rune number in the reserved range. Runes in this range are
    /// assigned by the protocol itself (unnamed etchings) and can never be
    /// chosen by an etcher.
    pub fn reserved_start() -> u128 {
        minimum_of_length(RESERVED_BOUNDARY_LENGTH)
    }

    /// The deterministic reservation formula used when an etching omits its
    /// rune name (spec §4.I step 3), keyed on the etching's location.
    pub fn reserved(block: u64, tx: u32) -> Self {
        Self(
            Self::reserved_start()
                .checked_add((u128::from(block) << 32) | u128::from(tx))
                .expect("reserved rune number overflowed u128"),
        )
    }

    pub fn is_reserved(self) -> bool {
        self.0 >= Self::reserved_start()
    }

    pub fn n(self) -> u128 {
        self.0
    }

    /// Block at which etching becomes possible at all on `network`.
    pub fn first_rune_height(network: Network) -> u32 {
        SUBSIDY_HALVING_INTERVAL
            * match network {
                Network::Bitcoin => 4,
                Network::Regtest => 0,
                _ => 12,
            }
    }

    /// The smallest rune whose name has the minimum length required for an
    /// etching confirmed at `height` on `network` (spec §4.B).
    pub fn minimum_at_height(network: Network, height: u32) -> Self {
        let offset = height.saturating_add(1);
        let activation = Self::first_rune_height(network);

        if offset < activation {
            return Self(minimum_of_length(MAXIMUM_MINIMUM_LENGTH));
        }

        let elapsed_steps = (offset - activation) / MINIMUM_NAME_STEP;
        let length = MAXIMUM_MINIMUM_LENGTH.saturating_sub(elapsed_steps as usize).max(1);

        Self(minimum_of_length(length))
    }

    /// Bytes an etcher must reveal in a taproot witness to authorize
    /// etching this name (spec §4.G, §4.J): the value little-endian, with
    /// insignificant trailing (i.e. high-order) zero bytes trimmed.
    pub fn commitment(self) -> Vec<u8> {
        let bytes = self.0.to_le_bytes();

        let mut end = bytes.len();
        while end > 0 && bytes[end - 1] == 0 {
            end -= 1;
        }

        bytes[..end].to_vec()
    }
}

/// Smallest rune number whose rendered name has exactly `len` letters,
/// under the bijective base-26 numbering of [`Rune`]'s `Display`/`FromStr`.
fn minimum_of_length(len: usize) -> u128 {
    let mut value: u128 = 0;
    let mut power: u128 = 1;

    for _ in 1..len {
        power = power.saturating_mul(26);
        value = value.saturating_add(power);
    }

    value
}

impl fmt::Display for Rune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut n = self.0;

        // bijective base-26: letter = n % 26, then n = n / 26 - 1, stopping
        // once the division underflows (treated here as a checked_sub on
        // the wrapped value rather than signed arithmetic).
        let mut symbol = String::new();

        loop {
            symbol.push(
                char::from_u32('A' as u32 + (n % 26) as u32).expect("u32 in 'A'..='Z' range"),
            );

            n /= 26;

            if n == 0 {
                break;
            }

            n -= 1;
        }

        write!(f, "{}", symbol.chars().rev().collect::<String>())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuneFromStrError {
    #[error("empty rune name")]
    Empty,
    #[error("rune name contains a character outside A-Z")]
    InvalidCharacter,
    #[error("rune name longer than {MAX_NAME_LENGTH} letters")]
    TooLong,
    #[error("rune name overflowed u128")]
    Overflow,
}

impl FromStr for Rune {
    type Err = RuneFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(RuneFromStrError::Empty);
        }

        if s.len() > MAX_NAME_LENGTH {
            return Err(RuneFromStrError::TooLong);
        }

        let mut n: u128 = 0;

        for (i, c) in s.chars().enumerate() {
            if !c.is_ascii_uppercase() {
                return Err(RuneFromStrError::InvalidCharacter);
            }

            if i > 0 {
                n = n.checked_add(1).ok_or(RuneFromStrError::Overflow)?;
            }

            n = n
                .checked_mul(26)
                .ok_or(RuneFromStrError::Overflow)?
                .checked_add(c as u128 - 'A' as u128)
                .ok_or(RuneFromStrError::Overflow)?;
        }

        Ok(Rune(n))
    }
}

impl serde::Serialize for Rune {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Rune {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rune::from_str(&s).map_err(serde::de::Error::custom)
    }
}
