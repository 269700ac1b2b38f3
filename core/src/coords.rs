//! Sky coordinates
//!
//! Right ascension and declination in the ICRS frame, stored as decimal
//! degrees. Text input is accepted either sexagesimal (`hh:mm:ss.ss`,
//! `±dd:mm:ss.ss`) or as plain decimal degrees.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SonifyError};

/// Text format of an RA/Dec pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoordUnit {
    /// Hours/minutes/seconds for RA, degrees/minutes/seconds for Dec
    #[default]
    HmsDms,
    /// Decimal degrees for both
    Degrees,
}

impl FromStr for CoordUnit {
    type Err = SonifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hms-dms" | "hmsdms" | "sexagesimal" => Ok(CoordUnit::HmsDms),
            "deg" | "degree" | "degrees" => Ok(CoordUnit::Degrees),
            other => Err(SonifyError::InvalidCoordinate(format!(
                "unknown coordinate unit '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CoordUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordUnit::HmsDms => f.write_str("hms-dms"),
            CoordUnit::Degrees => f.write_str("degrees"),
        }
    }
}

/// A validated ICRS position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
}

impl SkyPosition {
    /// Position from decimal degrees. RA must lie in `0..360`, Dec in `-90..=90`.
    pub fn from_degrees(ra_deg: f64, dec_deg: f64) -> Result<Self> {
        if !ra_deg.is_finite() || !(0.0..360.0).contains(&ra_deg) {
            return Err(SonifyError::InvalidCoordinate(format!(
                "right ascension {ra_deg} outside 0..360 degrees"
            )));
        }
        if !dec_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
            return Err(SonifyError::InvalidCoordinate(format!(
                "declination {dec_deg} outside -90..90 degrees"
            )));
        }
        // Adding zero folds -0.0 into 0.0 so equal positions hash equally
        Ok(Self {
            ra_deg: ra_deg + 0.0,
            dec_deg: dec_deg + 0.0,
        })
    }

    /// Parse an RA/Dec pair written in `unit`.
    pub fn parse(ra: &str, dec: &str, unit: CoordUnit) -> Result<Self> {
        let (ra_deg, dec_deg) = match unit {
            CoordUnit::Degrees => (parse_number(ra)?, parse_number(dec)?),
            CoordUnit::HmsDms => (parse_sexagesimal(ra)? * 15.0, parse_sexagesimal(dec)?),
        };
        Self::from_degrees(ra_deg, dec_deg)
    }

    pub fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    pub fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    pub fn frame(&self) -> &'static str {
        "icrs"
    }

    /// Right ascension as `hh:mm:ss.ss`.
    pub fn ra_hms(&self) -> String {
        let (h, m, s) = split_sexagesimal(self.ra_deg / 15.0);
        format!("{h:02}:{m:02}:{s:05.2}")
    }

    /// Declination as `±dd:mm:ss.s`.
    pub fn dec_dms(&self) -> String {
        let sign = if self.dec_deg < 0.0 { '-' } else { '+' };
        let (d, m, s) = split_sexagesimal(self.dec_deg.abs());
        format!("{sign}{d:02}:{m:02}:{s:04.1}")
    }
}

impl fmt::Display for SkyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.ra_deg, self.dec_deg)
    }
}

fn parse_number(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| SonifyError::InvalidCoordinate(format!("'{}' is not a number", text.trim())))
}

/// Parse `[±]a:b:c`, `[±]a b c` or `12h30m00s` style values into decimal units.
fn parse_sexagesimal(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let fields: Vec<&str> = body
        .split(|c: char| c == ':' || c.is_whitespace() || "hdms°'\"".contains(c))
        .filter(|field| !field.is_empty())
        .collect();
    if fields.is_empty() || fields.len() > 3 {
        return Err(SonifyError::InvalidCoordinate(format!(
            "'{trimmed}' is not a sexagesimal value"
        )));
    }

    let mut value = 0.0;
    for (index, field) in fields.iter().enumerate() {
        let part = parse_number(field)?;
        if part < 0.0 || (index > 0 && part >= 60.0) {
            return Err(SonifyError::InvalidCoordinate(format!(
                "'{trimmed}' has an out-of-range field '{field}'"
            )));
        }
        value += part / 60f64.powi(index as i32);
    }

    Ok(if negative { -value } else { value })
}

fn split_sexagesimal(value: f64) -> (u32, u32, f64) {
    let whole = value.trunc();
    let minutes = (value - whole) * 60.0;
    let seconds = (minutes - minutes.trunc()) * 60.0;
    (whole as u32, minutes.trunc() as u32, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_parse_hms_dms() {
        // M51
        let pos = SkyPosition::parse("13:29:52.7", "+47:11:43", CoordUnit::HmsDms).unwrap();
        assert!((pos.ra_deg() - 202.469_583).abs() < EPS);
        assert!((pos.dec_deg() - 47.195_278).abs() < EPS);
        assert_eq!(pos.frame(), "icrs");
    }

    #[test]
    fn test_parse_negative_declination() {
        let pos = SkyPosition::parse("05 35 17.3", "-05 23 28", CoordUnit::HmsDms).unwrap();
        assert!((pos.dec_deg() + 5.391_111).abs() < EPS);

        // Sign applies to the whole value, not just the degrees field
        let small = SkyPosition::parse("0:0:0", "-00:30:00", CoordUnit::HmsDms).unwrap();
        assert!((small.dec_deg() + 0.5).abs() < EPS);
    }

    #[test]
    fn test_negative_zero_declination() {
        let pos = SkyPosition::parse("00:00:00", "-00:00:00", CoordUnit::HmsDms).unwrap();
        assert!(pos.dec_deg().is_sign_positive());
        assert_eq!(pos, SkyPosition::from_degrees(0.0, 0.0).unwrap());
    }

    #[test]
    fn test_parse_letter_separators() {
        let pos = SkyPosition::parse("12h30m00s", "12d30m00s", CoordUnit::HmsDms).unwrap();
        assert!((pos.ra_deg() - 187.5).abs() < EPS);
        assert!((pos.dec_deg() - 12.5).abs() < EPS);
    }

    #[test]
    fn test_parse_degrees() {
        let pos = SkyPosition::parse(" 210.8 ", "54.35", CoordUnit::Degrees).unwrap();
        assert!((pos.ra_deg() - 210.8).abs() < EPS);
        assert!((pos.dec_deg() - 54.35).abs() < EPS);
    }

    #[test]
    fn test_out_of_range() {
        assert!(SkyPosition::from_degrees(360.0, 0.0).is_err());
        assert!(SkyPosition::from_degrees(-1.0, 0.0).is_err());
        assert!(SkyPosition::from_degrees(10.0, 90.5).is_err());
        assert!(SkyPosition::from_degrees(f64::NAN, 0.0).is_err());
        assert!(SkyPosition::parse("12:61:00", "0", CoordUnit::HmsDms).is_err());
        assert!(SkyPosition::parse("25:00:00", "0", CoordUnit::HmsDms).is_err());
    }

    #[test]
    fn test_garbage() {
        assert!(matches!(
            SkyPosition::parse("abc", "0", CoordUnit::Degrees),
            Err(SonifyError::InvalidCoordinate(_))
        ));
        assert!(SkyPosition::parse("", "0", CoordUnit::HmsDms).is_err());
        assert!(SkyPosition::parse("1:2:3:4", "0", CoordUnit::HmsDms).is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let pos = SkyPosition::parse("13:29:52.70", "+47:11:43.0", CoordUnit::HmsDms).unwrap();
        assert_eq!(pos.ra_hms(), "13:29:52.70");
        assert_eq!(pos.dec_dms(), "+47:11:43.0");
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!("degrees".parse::<CoordUnit>().unwrap(), CoordUnit::Degrees);
        assert_eq!("HMS-DMS".parse::<CoordUnit>().unwrap(), CoordUnit::HmsDms);
        assert!("parsecs".parse::<CoordUnit>().is_err());
    }
}
