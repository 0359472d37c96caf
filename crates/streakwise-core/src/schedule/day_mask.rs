//! Weekday bitmask used by weekly recurrence schedules.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Set of weekdays packed into seven bits: Monday = bit 0 .. Sunday = bit 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayMask(u8);

const ALL_BITS: u8 = 0b111_1111;

const ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl DayMask {
    pub const EMPTY: DayMask = DayMask(0);
    pub const EVERY_DAY: DayMask = DayMask(ALL_BITS);
    pub const WEEKDAYS: DayMask = DayMask(0b001_1111);
    pub const WEEKENDS: DayMask = DayMask(0b110_0000);

    /// Build a mask from raw bits. Bits above Sunday are rejected.
    pub fn from_bits(bits: u8) -> Result<Self, ValidationError> {
        if bits & !ALL_BITS != 0 {
            return Err(ValidationError::InvalidValue {
                field: "day_mask".into(),
                message: format!("{bits:#b} has bits outside Monday..Sunday"),
            });
        }
        Ok(DayMask(bits))
    }

    pub fn from_weekdays<I: IntoIterator<Item = Weekday>>(days: I) -> Self {
        days.into_iter()
            .fold(DayMask::EMPTY, |mask, day| mask.with(day))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Return a copy with `day` added.
    pub fn with(self, day: Weekday) -> Self {
        DayMask(self.0 | bit(day))
    }

    /// Return a copy with `day` removed.
    pub fn without(self, day: Weekday) -> Self {
        DayMask(self.0 & !bit(day))
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & bit(day) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of weekdays in the mask.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Weekdays in the mask, Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ORDER.into_iter().filter(move |d| self.contains(*d))
    }
}

fn bit(day: Weekday) -> u8 {
    1 << day.num_days_from_monday()
}

impl TryFrom<u8> for DayMask {
    type Error = ValidationError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        DayMask::from_bits(bits)
    }
}

impl From<DayMask> for u8 {
    fn from(mask: DayMask) -> Self {
        mask.0
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .iter()
            .map(|d| d.to_string().to_lowercase())
            .collect();
        write!(f, "{}", names.join(","))
    }
}

/// Accepts `daily`, `weekdays`, `weekends` or a comma-separated list of
/// weekday names (`mon,wed,fri`, `Monday, Thursday`).
impl FromStr for DayMask {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "every_day" | "everyday" => return Ok(DayMask::EVERY_DAY),
            "weekdays" => return Ok(DayMask::WEEKDAYS),
            "weekends" => return Ok(DayMask::WEEKENDS),
            _ => {}
        }

        let mut mask = DayMask::EMPTY;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let day = Weekday::from_str(token).map_err(|_| ValidationError::InvalidValue {
                field: "day_mask".into(),
                message: format!("unknown weekday '{token}'"),
            })?;
            mask = mask.with(day);
        }
        Ok(mask)
    }
}
