//! Illinois Productivity Index.
//!
//! A map symbol such as `36C2` reads as soil code `36`, slope band `C` and
//! sub-slope digit `2`. The band row and digit pick a multiplier that scales
//! the soil's base rating.

use crate::lookup::{slope_band, ReferenceTables, SLOPE_BANDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubSlope {
    None,
    Two,
    Three,
}

impl SubSlope {
    fn column(self) -> usize {
        match self {
            Self::None => 0,
            Self::Two => 1,
            Self::Three => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub soil_code: String,
    pub band: char,
    pub sub_slope: SubSlope,
}

/// Splits a map symbol on the last band letter it contains.
///
/// The letter may sit anywhere in the symbol, not only after the soil code,
/// and symbols with no band letter (or starting with one) fall back to band
/// A. Both are known approximations kept until the rating tables say
/// otherwise.
pub fn parse_symbol(code: &str) -> ParsedSymbol {
    let mut soil_code = "";
    let mut band = 'A';
    let mut sub_slope = SubSlope::None;

    for (letter, _) in SLOPE_BANDS.iter() {
        if !code.contains(*letter) {
            continue;
        }
        soil_code = code.split(*letter).next().unwrap_or_default();
        let tail = code.rsplit(*letter).next().unwrap_or_default();
        sub_slope = match tail {
            "2" => SubSlope::Two,
            "3" => SubSlope::Three,
            _ => SubSlope::None,
        };
        band = *letter;
    }

    if soil_code.is_empty() {
        return ParsedSymbol {
            soil_code: String::new(),
            band: 'A',
            sub_slope: SubSlope::None,
        };
    }

    ParsedSymbol {
        soil_code: soil_code.to_string(),
        band,
        sub_slope,
    }
}

/// PI for one map symbol, or `None` when the ratings table has no entry.
pub fn pi_value(musym: &str, tables: &ReferenceTables) -> Option<u32> {
    let rating = tables.pi_rating(musym)?;
    let parsed = parse_symbol(musym);
    let offset = if rating.unfavorable == 0 { 0 } else { 3 };
    let multiplier = slope_band(parsed.band)?
        .get(parsed.sub_slope.column() + offset)
        .copied()?;
    let value = (rating.value * multiplier).round_ties_even();
    if value.is_finite() {
        Some(value.max(0.0) as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::packaged().expect("packaged tables should parse")
    }

    #[test]
    fn parse_symbol_with_band_and_sub_slope() {
        let parsed = parse_symbol("36C2");
        assert_eq!(parsed.soil_code, "36");
        assert_eq!(parsed.band, 'C');
        assert_eq!(parsed.sub_slope, SubSlope::Two);
    }

    #[test]
    fn parse_symbol_discards_other_trailing_values() {
        let parsed = parse_symbol("280D5");
        assert_eq!(parsed.band, 'D');
        assert_eq!(parsed.sub_slope, SubSlope::None);
    }

    #[test]
    fn parse_symbol_without_letter_defaults_to_band_a() {
        let parsed = parse_symbol("1070L");
        assert_eq!(parsed.band, 'A');
        assert_eq!(parsed.sub_slope, SubSlope::None);
        assert!(parsed.soil_code.is_empty());
    }

    #[test]
    fn parse_symbol_uses_last_matching_band_letter() {
        // Both A and B occur; B is scanned later and wins.
        let parsed = parse_symbol("8A1B3");
        assert_eq!(parsed.band, 'B');
        assert_eq!(parsed.soil_code, "8A1");
        assert_eq!(parsed.sub_slope, SubSlope::Three);
    }

    #[test]
    fn favorable_symbol_uses_first_columns() {
        // 135 * 0.93 = 125.55
        assert_eq!(pi_value("36C2", &tables()), Some(126));
        // 140 * 1.00
        assert_eq!(pi_value("152A", &tables()), Some(140));
    }

    #[test]
    fn unfavorable_symbol_uses_offset_columns() {
        // 114 * 0.90 = 102.6
        assert_eq!(pi_value("243C2", &tables()), Some(103));
        // 112 * 0.99 = 110.88
        assert_eq!(pi_value("171B", &tables()), Some(111));
    }

    #[test]
    fn symbol_without_band_letter_uses_band_a_multiplier() {
        let tables = tables();
        let rating = tables.pi_rating("W").expect("W should be rated");
        assert_eq!(
            pi_value("W", &tables),
            Some((rating.value * SLOPE_BANDS[0].1[0]).round_ties_even() as u32)
        );
    }

    #[test]
    fn unknown_symbol_is_null() {
        assert_eq!(pi_value("999Z", &tables()), None);
    }
}
