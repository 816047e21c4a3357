//! Typed station values.
//!
//! A station encodes a distance along an alignment in the `HH+RR` notation
//! used on engineering plans: the whole-unit distance is split into hundreds
//! and a two-digit remainder, so 125 units renders as `01+25`. The value is
//! stored numerically and ordered numerically; sorting the rendered labels
//! as text would put `100+00` before `99+99`.

use crate::error::{ChainageError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Whole-unit distance along an alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Station(pub u64);

impl Station {
    /// Round a distance along the alignment to the nearest whole unit.
    ///
    /// Rounding is half away from zero. Negative, NaN, and infinite
    /// distances are rejected.
    pub fn from_distance(distance: f64) -> Result<Self> {
        if !distance.is_finite() {
            return Err(ChainageError::InvalidStation {
                distance,
                reason: "distance must be finite".to_string(),
            });
        }
        if distance < 0.0 {
            return Err(ChainageError::InvalidStation {
                distance,
                reason: "distance must be non-negative".to_string(),
            });
        }
        Ok(Station(distance.round() as u64))
    }

    /// Whole units along the alignment
    pub fn units(&self) -> u64 {
        self.0
    }

    /// Hundreds part of the label (left of the `+`)
    pub fn hundreds(&self) -> u64 {
        self.0 / 100
    }

    /// Remainder part of the label (right of the `+`), always < 100
    pub fn remainder(&self) -> u64 {
        self.0 % 100
    }
}

impl fmt::Display for Station {
    /// Render as `HH+RR`: hundreds zero-padded to at least two digits and
    /// unbounded above, remainder always exactly two digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}+{:02}", self.hundreds(), self.remainder())
    }
}

impl FromStr for Station {
    type Err = ChainageError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = |reason: &str| ChainageError::StationParse {
            label: s.to_string(),
            reason: reason.to_string(),
        };

        let (hundreds, remainder) =
            s.split_once('+').ok_or_else(|| malformed("expected 'HH+RR'"))?;
        let hundreds: u64 =
            hundreds.parse().map_err(|_| malformed("hundreds part is not a number"))?;
        let remainder: u64 =
            remainder.parse().map_err(|_| malformed("remainder part is not a number"))?;
        if remainder >= 100 {
            return Err(malformed("remainder part must be below 100"));
        }

        Ok(Station(hundreds * 100 + remainder))
    }
}

impl Serialize for Station {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Station {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_station_rendering() {
        assert_eq!(Station::from_distance(0.0).unwrap().to_string(), "00+00");
        assert_eq!(Station::from_distance(91.521).unwrap().to_string(), "00+92");
        assert_eq!(Station::from_distance(124.836).unwrap().to_string(), "01+25");
        assert_eq!(Station::from_distance(10000.0).unwrap().to_string(), "100+00");
    }

    #[test]
    fn test_hundreds_grow_unbounded() {
        assert_eq!(Station(123456).to_string(), "1234+56");
        assert_eq!(Station(99).to_string(), "00+99");
        assert_eq!(Station(100).to_string(), "01+00");
    }

    #[test]
    fn test_rejects_bad_distances() {
        assert!(Station::from_distance(-0.001).is_err());
        assert!(Station::from_distance(f64::NAN).is_err());
        assert!(Station::from_distance(f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_label() {
        assert_eq!("00+92".parse::<Station>().unwrap(), Station(92));
        assert_eq!("100+00".parse::<Station>().unwrap(), Station(10000));
        assert!("92".parse::<Station>().is_err());
        assert!("00+123".parse::<Station>().is_err());
        assert!("ab+cd".parse::<Station>().is_err());
    }

    #[test]
    fn test_numeric_ordering() {
        let before: Station = "99+99".parse().unwrap();
        let after: Station = "100+00".parse().unwrap();
        assert!(before < after, "station ordering must be numeric, not lexicographic");
    }

    #[test]
    fn test_serde_as_label() {
        let station = Station(125);
        let json = serde_json::to_string(&station).unwrap();
        assert_eq!(json, "\"01+25\"");

        let parsed: Station = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, station);
    }

    proptest! {
        #[test]
        fn prop_label_roundtrip(units in 0u64..10_000_000) {
            let station = Station(units);
            let parsed: Station = station.to_string().parse().unwrap();
            prop_assert_eq!(parsed, station);
        }

        #[test]
        fn prop_decomposition(distance in 0.0f64..1e9) {
            let station = Station::from_distance(distance).unwrap();
            prop_assert_eq!(station.hundreds() * 100 + station.remainder(), station.units());
            prop_assert!(station.remainder() < 100);
        }

        #[test]
        fn prop_ordering_matches_distance(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            prop_assert_eq!(Station(a).cmp(&Station(b)), a.cmp(&b));
        }
    }
}
