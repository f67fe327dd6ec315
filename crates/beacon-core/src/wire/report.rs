//! Inbound coordinate reports.

use serde::Deserialize;

use super::position::Position;
use crate::errors::ReportError;

/// A peer's report of its own position: `{"id": "…", "lat": …, "lng": …}`.
///
/// Only `lat` and `lng` are read. Any `id` the client sends is ignored; the
/// relay attributes the report to the session it arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CoordinateReport {
    /// Reported latitude.
    pub lat: f64,
    /// Reported longitude.
    pub lng: f64,
}

impl CoordinateReport {
    /// Parse a text frame. Only a JSON object is accepted.
    pub fn parse(text: &str) -> Result<Self, ReportError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(ReportError::NotAnObject);
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a binary frame, which must hold UTF-8 JSON.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, ReportError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ReportError::NotUtf8)?;
        Self::parse(text)
    }

    /// The reported coordinates.
    pub const fn position(self) -> Position {
        Position::new(self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_report() {
        let report =
            CoordinateReport::parse(r#"{"id":"1","lat":42.388282,"lng":-71.153968}"#).unwrap();
        assert_eq!(report.position(), Position::new(42.388_282, -71.153_968));
    }

    #[test]
    fn client_id_is_ignored() {
        let a = CoordinateReport::parse(r#"{"id":"999","lat":1,"lng":2}"#).unwrap();
        let b = CoordinateReport::parse(r#"{"id":17,"lat":1,"lng":2}"#).unwrap();
        let c = CoordinateReport::parse(r#"{"lat":1,"lng":2}"#).unwrap();
        assert_eq!(a, c);
        assert_eq!(b, c);
    }

    #[test]
    fn integer_coordinates_accepted() {
        let report = CoordinateReport::parse(r#"{"lat":10,"lng":-20}"#).unwrap();
        assert_eq!(report.position(), Position::new(10.0, -20.0));
    }

    #[test]
    fn missing_coordinate_is_malformed() {
        let err = CoordinateReport::parse(r#"{"lat":1}"#).unwrap_err();
        assert!(matches!(err, ReportError::Malformed(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(CoordinateReport::parse("hello").is_err());
        assert!(CoordinateReport::parse("").is_err());
    }

    #[test]
    fn array_is_not_a_report() {
        let err = CoordinateReport::parse("[1,2]").unwrap_err();
        assert!(matches!(err, ReportError::NotAnObject));
    }

    #[test]
    fn string_coordinates_are_malformed() {
        assert!(CoordinateReport::parse(r#"{"lat":"1","lng":"2"}"#).is_err());
    }

    #[test]
    fn binary_utf8_report() {
        let report = CoordinateReport::parse_bytes(br#"{"lat":3.5,"lng":4}"#).unwrap();
        assert_eq!(report.position(), Position::new(3.5, 4.0));
    }

    #[test]
    fn binary_non_utf8_rejected() {
        let err = CoordinateReport::parse_bytes(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ReportError::NotUtf8));
    }
}
