//! Shared validation helpers for inbound HTTP adapters.
//!
//! Every helper returns the domain [`Error`] with `{field, code}` details so
//! clients can report problems per field.

use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use serde_json::json;

use crate::domain::Error;
use crate::domain::listing::{City, PropertyType, RoomType};

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn invalid_choice_error(field: FieldName, value: &str, choices: &[&str]) -> Error {
    let field = field.as_str();
    Error::invalid_request(format!("{field} must be one of: {}", choices.join(", ")))
        .with_details(json!({
            "field": field,
            "value": value,
            "code": "invalid_choice",
            "choices": choices,
        }))
}

pub(crate) fn parse_property_type(value: &str, field: FieldName) -> Result<PropertyType, Error> {
    PropertyType::from_str(value).map_err(|_| {
        let choices: Vec<&str> = PropertyType::ALL.iter().map(|c| c.as_str()).collect();
        invalid_choice_error(field, value, &choices)
    })
}

pub(crate) fn parse_city(value: &str, field: FieldName) -> Result<City, Error> {
    City::from_str(value).map_err(|_| {
        let choices: Vec<&str> = City::ALL.iter().map(|c| c.as_str()).collect();
        invalid_choice_error(field, value, &choices)
    })
}

pub(crate) fn parse_room_type(value: &str, field: FieldName) -> Result<RoomType, Error> {
    RoomType::from_str(value).map_err(|_| {
        let choices: Vec<&str> = RoomType::ALL.iter().map(|c| c.as_str()).collect();
        invalid_choice_error(field, value, &choices)
    })
}

pub(crate) fn parse_date(value: &str, field: FieldName) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let field = field.as_str();
        Error::invalid_request(format!("{field} must be an ISO date (YYYY-MM-DD)")).with_details(
            json!({
                "field": field,
                "value": value,
                "code": "invalid_date",
            }),
        )
    })
}

pub(crate) fn parse_price(value: i64, field: FieldName) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| {
        let field = field.as_str();
        Error::invalid_request(format!(
            "{field} must be a non-negative integer no larger than {}",
            u32::MAX
        ))
        .with_details(json!({
            "field": field,
            "value": value,
            "code": "invalid_price",
        }))
    })
}

pub(crate) fn decode_base64(value: &str, field: FieldName) -> Result<Vec<u8>, Error> {
    BASE64.decode(value).map_err(|_| {
        let field = field.as_str();
        Error::invalid_request(format!("{field} must be base64-encoded")).with_details(json!({
            "field": field,
            "code": "invalid_base64",
        }))
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for field parsing and error details.
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    fn unknown_choice_reports_field_and_choices() {
        let err = parse_city("Lalitpur", FieldName::new("location")).expect_err("unknown city");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "location");
        assert_eq!(details["code"], "invalid_choice");
        assert_eq!(details["choices"][1], "Pokhara");
    }

    #[rstest]
    #[case("2025-09-01", true)]
    #[case("01/09/2025", false)]
    #[case("2025-13-01", false)]
    fn dates_parse_iso_only(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(parse_date(raw, FieldName::new("availableFrom")).is_ok(), ok);
    }

    #[rstest]
    #[case(0, true)]
    #[case(5000, true)]
    #[case(-1, false)]
    #[case(i64::MAX, false)]
    fn prices_must_fit_a_non_negative_u32(#[case] raw: i64, #[case] ok: bool) {
        assert_eq!(parse_price(raw, FieldName::new("price")).is_ok(), ok);
    }

    #[rstest]
    fn base64_decoding_reports_the_field() {
        let err = decode_base64("not!!base64", FieldName::new("images"))
            .expect_err("invalid base64");
        let details = err.details().expect("details");
        assert_eq!(details["code"], "invalid_base64");
    }

    #[rstest]
    fn room_types_accept_wire_spellings() {
        assert!(parse_room_type("1BHK", FieldName::new("roomType")).is_ok());
        assert!(parse_room_type("flatshare", FieldName::new("roomType")).is_err());
    }

    #[rstest]
    fn property_types_parse() {
        assert!(parse_property_type("Hostel", FieldName::new("propertyType")).is_ok());
    }
}
