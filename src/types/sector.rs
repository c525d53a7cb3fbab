//! Track sectors

use serde::{Deserialize, Serialize};

use crate::error::StatsError;

/// One of the three timed sectors of a lap.
///
/// Sector-indexed queries take this type, so a sector outside `1..=3` cannot
/// reach the aggregators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Sector {
    One,
    Two,
    Three,
}

impl Sector {
    /// All sectors in track order.
    pub const ALL: [Sector; 3] = [Sector::One, Sector::Two, Sector::Three];

    /// Sector for a 1-based number.
    ///
    /// # Panics
    ///
    /// Panics when `number` is not 1, 2 or 3. Use [`Sector::try_from`] for
    /// numbers coming from outside the program.
    pub fn new(number: u8) -> Self {
        match Sector::try_from(number) {
            Ok(sector) => sector,
            Err(_) => panic!("sector must be 1, 2 or 3, got {number}"),
        }
    }

    /// 1-based sector number.
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// 0-based position in a lap's sector time sequence.
    pub fn index(self) -> usize {
        match self {
            Sector::One => 0,
            Sector::Two => 1,
            Sector::Three => 2,
        }
    }
}

impl TryFrom<u8> for Sector {
    type Error = StatsError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Sector::One),
            2 => Ok(Sector::Two),
            3 => Ok(Sector::Three),
            other => Err(StatsError::invalid_sector(other)),
        }
    }
}

impl From<Sector> for u8 {
    fn from(sector: Sector) -> Self {
        sector.number()
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.number())
    }
}
