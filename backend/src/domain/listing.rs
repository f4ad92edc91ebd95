//! Listing aggregate: property listings, gallery images, and the closed
//! vocabularies describing them.
//!
//! Construction goes through validated types. Inbound adapters parse raw
//! strings into the enums, operations assemble a [`ListingDraft`] or
//! [`ListingChanges`], and the pure validation runs before anything touches
//! a port. Fields that must never change after creation (`owner`,
//! `created_at`) are deliberately absent from the mutable input types, so an
//! edit cannot express them at all.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};

use crate::domain::ports::BlobHandle;
use crate::domain::user::UserId;

/// Maximum accepted length for listing titles.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum accepted length for the contact display name.
pub const MAX_OWNER_NAME_LEN: usize = 100;
/// Maximum accepted length for the contact number.
pub const MAX_CONTACT_NUMBER_LEN: usize = 15;

/// Identifier of a persisted [`Listing`].
///
/// Assigned by the persistence layer from a monotonically increasing
/// sequence, so descending id order matches reverse insertion order, which
/// the search tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListingId(i64);

impl ListingId {
    /// Wrap a raw database identifier.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a persisted [`ListingImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(i64);

impl ImageId {
    /// Wrap a raw database identifier.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw identifier value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of property being let.
///
/// The vocabulary is closed; extending it is a data-model migration, not a
/// code branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// A single room inside a shared property.
    Room,
    /// A self-contained apartment.
    Apartment,
    /// A hostel bed or dormitory space.
    Hostel,
}

impl PropertyType {
    /// Every supported property type.
    pub const ALL: [Self; 3] = [Self::Room, Self::Apartment, Self::Hostel];

    /// Canonical wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Room => "Room",
            Self::Apartment => "Apartment",
            Self::Hostel => "Hostel",
        }
    }
}

/// Error returned when a property type spelling is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown property type")]
pub struct ParsePropertyTypeError;

impl FromStr for PropertyType {
    type Err = ParsePropertyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" => Ok(Self::Room),
            "apartment" => Ok(Self::Apartment),
            "hostel" => Ok(Self::Hostel),
            _ => Err(ParsePropertyTypeError),
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum City {
    /// Kathmandu.
    Kathmandu,
    /// Pokhara.
    Pokhara,
    /// Biratnagar.
    Biratnagar,
}

impl City {
    /// Every supported city.
    pub const ALL: [Self; 3] = [Self::Kathmandu, Self::Pokhara, Self::Biratnagar];

    /// Canonical wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kathmandu => "Kathmandu",
            Self::Pokhara => "Pokhara",
            Self::Biratnagar => "Biratnagar",
        }
    }
}

/// Error returned when a city spelling is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown city")]
pub struct ParseCityError;

impl FromStr for City {
    type Err = ParseCityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kathmandu" => Ok(Self::Kathmandu),
            "pokhara" => Ok(Self::Pokhara),
            "biratnagar" => Ok(Self::Biratnagar),
            _ => Err(ParseCityError),
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room configuration on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomType {
    /// Single occupancy.
    Single,
    /// Double occupancy.
    Double,
    /// Shared occupancy.
    Shared,
    /// One bedroom, hall, kitchen.
    OneBhk,
    /// Two bedrooms, hall, kitchen.
    TwoBhk,
    /// Three bedrooms, hall, kitchen.
    ThreeBhk,
}

impl RoomType {
    /// Every supported room type.
    pub const ALL: [Self; 6] = [
        Self::Single,
        Self::Double,
        Self::Shared,
        Self::OneBhk,
        Self::TwoBhk,
        Self::ThreeBhk,
    ];

    /// Canonical wire spelling (`1BHK`-style for the BHK variants).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Double => "Double",
            Self::Shared => "Shared",
            Self::OneBhk => "1BHK",
            Self::TwoBhk => "2BHK",
            Self::ThreeBhk => "3BHK",
        }
    }
}

/// Error returned when a room type spelling is outside the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown room type")]
pub struct ParseRoomTypeError;

impl FromStr for RoomType {
    type Err = ParseRoomTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            "shared" => Ok(Self::Shared),
            "1bhk" => Ok(Self::OneBhk),
            "2bhk" => Ok(Self::TwoBhk),
            "3bhk" => Ok(Self::ThreeBhk),
            _ => Err(ParseRoomTypeError),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated constraint on a listing field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    field: &'static str,
    code: &'static str,
    message: String,
}

impl FieldViolation {
    /// The offending field name, in wire spelling.
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Stable machine-readable violation code.
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Validation failure carrying every violated field constraint at once, so
/// callers can report the whole form rather than the first problem found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingValidationError {
    violations: Vec<FieldViolation>,
}

impl ListingValidationError {
    /// The individual violations.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Structured details for the error envelope.
    pub fn to_details(&self) -> Value {
        json!({
            "violations": self
                .violations
                .iter()
                .map(|violation| {
                    json!({
                        "field": violation.field(),
                        "code": violation.code(),
                        "message": violation.message(),
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

impl fmt::Display for ListingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self
            .violations
            .iter()
            .map(FieldViolation::message)
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ListingValidationError {}

fn check_text(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
    max_len: usize,
) {
    if value.trim().is_empty() {
        violations.push(FieldViolation {
            field,
            code: "empty_field",
            message: format!("{field} must not be empty"),
        });
    } else if value.chars().count() > max_len {
        violations.push(FieldViolation {
            field,
            code: "too_long",
            message: format!("{field} must be at most {max_len} characters"),
        });
    }
}

fn finish(violations: Vec<FieldViolation>) -> Result<(), ListingValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ListingValidationError { violations })
    }
}

/// Input for creating a listing.
///
/// Owner and creation timestamp are never part of the payload: creation
/// stamps them from the acting identity and the clock, so a spoofed owner
/// cannot even be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    /// Kind of property.
    pub property_type: PropertyType,
    /// Listing headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Monthly rent; non-negative by construction.
    pub price: u32,
    /// City the property is in.
    pub location: City,
    /// Room configuration.
    pub room_type: RoomType,
    /// Contact display name.
    pub owner_name: String,
    /// Contact phone number (length-checked only).
    pub contact_number: String,
    /// First date the property is available.
    pub available_from: NaiveDate,
}

impl ListingDraft {
    /// Pure validation, collecting every violated field constraint.
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        let mut violations = Vec::new();
        check_text(&mut violations, "title", &self.title, MAX_TITLE_LEN);
        check_text(
            &mut violations,
            "ownerName",
            &self.owner_name,
            MAX_OWNER_NAME_LEN,
        );
        check_text(
            &mut violations,
            "contactNumber",
            &self.contact_number,
            MAX_CONTACT_NUMBER_LEN,
        );
        finish(violations)
    }
}

/// Partial update for a listing; `None` leaves a field untouched.
///
/// Owner and creation timestamp have no slot here, so an edit cannot change
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingChanges {
    /// Replacement property type.
    pub property_type: Option<PropertyType>,
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement rent.
    pub price: Option<u32>,
    /// Replacement city.
    pub location: Option<City>,
    /// Replacement room configuration.
    pub room_type: Option<RoomType>,
    /// Replacement contact display name.
    pub owner_name: Option<String>,
    /// Replacement contact number.
    pub contact_number: Option<String>,
    /// Replacement availability date.
    pub available_from: Option<NaiveDate>,
    /// Replacement cover image handle.
    pub cover_image: Option<BlobHandle>,
}

impl ListingChanges {
    /// Pure validation over the fields that are present.
    pub fn validate(&self) -> Result<(), ListingValidationError> {
        let mut violations = Vec::new();
        if let Some(title) = &self.title {
            check_text(&mut violations, "title", title, MAX_TITLE_LEN);
        }
        if let Some(owner_name) = &self.owner_name {
            check_text(&mut violations, "ownerName", owner_name, MAX_OWNER_NAME_LEN);
        }
        if let Some(contact_number) = &self.contact_number {
            check_text(
                &mut violations,
                "contactNumber",
                contact_number,
                MAX_CONTACT_NUMBER_LEN,
            );
        }
        finish(violations)
    }

    /// True when no field is being changed.
    pub const fn is_empty(&self) -> bool {
        self.property_type.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.location.is_none()
            && self.room_type.is_none()
            && self.owner_name.is_none()
            && self.contact_number.is_none()
            && self.available_from.is_none()
            && self.cover_image.is_none()
    }
}

/// Raw parts for assembling a [`Listing`].
///
/// Used by persistence adapters and test doubles when rehydrating rows;
/// [`Listing::new`] re-runs field validation so stored data outside the
/// constraints surfaces as an error instead of leaking into the domain.
#[derive(Debug, Clone)]
pub struct ListingRecord {
    /// System-assigned identifier.
    pub id: ListingId,
    /// Owning identity.
    pub owner: UserId,
    /// Kind of property.
    pub property_type: PropertyType,
    /// Listing headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Monthly rent.
    pub price: u32,
    /// City the property is in.
    pub location: City,
    /// Room configuration.
    pub room_type: RoomType,
    /// Contact display name.
    pub owner_name: String,
    /// Contact phone number.
    pub contact_number: String,
    /// First date the property is available.
    pub available_from: NaiveDate,
    /// Optional stored cover photo.
    pub cover_image: Option<BlobHandle>,
    /// System-assigned creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A published rental property.
///
/// ## Invariants
/// - `owner` is assigned once at creation from the authenticated actor and
///   has no mutation path: [`ListingChanges`] cannot express it.
/// - `created_at` is system-assigned and immutable; it is the default sort
///   key, newest first.
///
/// The lifecycle is single-state: created, updated any number of times by
/// the owner, then deleted (terminal). There is no unpublish or archive
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    id: ListingId,
    owner: UserId,
    property_type: PropertyType,
    title: String,
    description: String,
    price: u32,
    location: City,
    room_type: RoomType,
    owner_name: String,
    contact_number: String,
    available_from: NaiveDate,
    cover_image: Option<BlobHandle>,
    created_at: DateTime<Utc>,
}

impl Listing {
    /// Assemble a listing from raw parts, validating the field constraints.
    pub fn new(record: ListingRecord) -> Result<Self, ListingValidationError> {
        let ListingRecord {
            id,
            owner,
            property_type,
            title,
            description,
            price,
            location,
            room_type,
            owner_name,
            contact_number,
            available_from,
            cover_image,
            created_at,
        } = record;

        let mut violations = Vec::new();
        check_text(&mut violations, "title", &title, MAX_TITLE_LEN);
        check_text(&mut violations, "ownerName", &owner_name, MAX_OWNER_NAME_LEN);
        check_text(
            &mut violations,
            "contactNumber",
            &contact_number,
            MAX_CONTACT_NUMBER_LEN,
        );
        finish(violations)?;

        Ok(Self {
            id,
            owner,
            property_type,
            title,
            description,
            price,
            location,
            room_type,
            owner_name,
            contact_number,
            available_from,
            cover_image,
            created_at,
        })
    }

    /// System-assigned identifier.
    pub const fn id(&self) -> ListingId {
        self.id
    }

    /// Owning identity.
    pub const fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Kind of property.
    pub const fn property_type(&self) -> PropertyType {
        self.property_type
    }

    /// Listing headline.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Monthly rent.
    pub const fn price(&self) -> u32 {
        self.price
    }

    /// City the property is in.
    pub const fn location(&self) -> City {
        self.location
    }

    /// Room configuration.
    pub const fn room_type(&self) -> RoomType {
        self.room_type
    }

    /// Contact display name.
    pub fn owner_name(&self) -> &str {
        self.owner_name.as_str()
    }

    /// Contact phone number.
    pub fn contact_number(&self) -> &str {
        self.contact_number.as_str()
    }

    /// First date the property is available.
    pub const fn available_from(&self) -> NaiveDate {
        self.available_from
    }

    /// Optional stored cover photo.
    pub const fn cover_image(&self) -> Option<&BlobHandle> {
        self.cover_image.as_ref()
    }

    /// System-assigned creation timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a partial update, leaving owner and creation metadata intact.
    ///
    /// Callers are expected to have run [`ListingChanges::validate`] first.
    pub fn with_changes(mut self, changes: &ListingChanges) -> Self {
        if let Some(value) = changes.property_type {
            self.property_type = value;
        }
        if let Some(value) = &changes.title {
            self.title = value.clone();
        }
        if let Some(value) = &changes.description {
            self.description = value.clone();
        }
        if let Some(value) = changes.price {
            self.price = value;
        }
        if let Some(value) = changes.location {
            self.location = value;
        }
        if let Some(value) = changes.room_type {
            self.room_type = value;
        }
        if let Some(value) = &changes.owner_name {
            self.owner_name = value.clone();
        }
        if let Some(value) = &changes.contact_number {
            self.contact_number = value.clone();
        }
        if let Some(value) = changes.available_from {
            self.available_from = value;
        }
        if let Some(value) = &changes.cover_image {
            self.cover_image = Some(value.clone());
        }
        self
    }
}

/// One gallery photo belonging to exactly one listing.
///
/// ## Invariants
/// - The parent reference is immutable; an image never moves between
///   listings.
/// - Existence is wholly dependent on the parent: deleting the listing
///   deletes its images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingImage {
    id: ImageId,
    listing_id: ListingId,
    blob: BlobHandle,
}

impl ListingImage {
    /// Assemble an image from its persisted parts.
    pub const fn new(id: ImageId, listing_id: ListingId, blob: BlobHandle) -> Self {
        Self {
            id,
            listing_id,
            blob,
        }
    }

    /// System-assigned identifier.
    pub const fn id(&self) -> ImageId {
        self.id
    }

    /// Parent listing.
    pub const fn listing_id(&self) -> ListingId {
        self.listing_id
    }

    /// Stored blob reference.
    pub const fn blob(&self) -> &BlobHandle {
        &self.blob
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for vocabularies and field validation.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Room", PropertyType::Room)]
    #[case("apartment", PropertyType::Apartment)]
    #[case("HOSTEL", PropertyType::Hostel)]
    fn property_types_parse_case_insensitively(
        #[case] raw: &str,
        #[case] expected: PropertyType,
    ) {
        assert_eq!(raw.parse::<PropertyType>(), Ok(expected));
    }

    #[rstest]
    #[case("1BHK", RoomType::OneBhk)]
    #[case("1bhk", RoomType::OneBhk)]
    #[case("2BHK", RoomType::TwoBhk)]
    #[case("3bhk", RoomType::ThreeBhk)]
    #[case("shared", RoomType::Shared)]
    fn room_types_parse_case_insensitively(#[case] raw: &str, #[case] expected: RoomType) {
        assert_eq!(raw.parse::<RoomType>(), Ok(expected));
    }

    #[rstest]
    #[case::property("Flat")]
    #[case::blank("")]
    fn unknown_property_types_are_rejected(#[case] raw: &str) {
        assert_eq!(raw.parse::<PropertyType>(), Err(ParsePropertyTypeError));
    }

    #[rstest]
    fn unknown_city_is_rejected() {
        assert_eq!("Lalitpur".parse::<City>(), Err(ParseCityError));
    }

    fn draft() -> ListingDraft {
        ListingDraft {
            property_type: PropertyType::Room,
            title: "Cozy Room".to_owned(),
            description: "South facing, attached bath".to_owned(),
            price: 8000,
            location: City::Pokhara,
            room_type: RoomType::Single,
            owner_name: "Sita".to_owned(),
            contact_number: "9800000000".to_owned(),
            available_from: NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date"),
        }
    }

    #[rstest]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[rstest]
    fn validation_collects_every_violation() {
        let mut bad = draft();
        bad.title = String::new();
        bad.owner_name = "x".repeat(101);
        bad.contact_number = "98000000000000000000".to_owned();

        let err = bad.validate().expect_err("three violations expected");
        let fields: Vec<&str> = err
            .violations()
            .iter()
            .map(|violation| violation.field())
            .collect();
        assert_eq!(fields, vec!["title", "ownerName", "contactNumber"]);

        let details = err.to_details();
        assert_eq!(details["violations"][0]["code"], "empty_field");
        assert_eq!(details["violations"][1]["code"], "too_long");
    }

    #[rstest]
    fn empty_changes_skip_validation_and_report_empty() {
        let changes = ListingChanges::default();
        assert!(changes.is_empty());
        assert!(changes.validate().is_ok());
    }

    #[rstest]
    fn with_changes_keeps_owner_and_created_at() {
        let owner = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
        let d = draft();
        let created_at = Utc::now();
        let listing = Listing::new(ListingRecord {
            id: ListingId::new(7),
            owner,
            property_type: d.property_type,
            title: d.title,
            description: d.description,
            price: d.price,
            location: d.location,
            room_type: d.room_type,
            owner_name: d.owner_name,
            contact_number: d.contact_number,
            available_from: d.available_from,
            cover_image: None,
            created_at,
        })
        .expect("valid record");

        let updated = listing.with_changes(&ListingChanges {
            price: Some(9500),
            title: Some("Bright Room".to_owned()),
            ..ListingChanges::default()
        });

        assert_eq!(updated.price(), 9500);
        assert_eq!(updated.title(), "Bright Room");
        assert_eq!(updated.owner(), &owner);
        assert_eq!(updated.created_at(), created_at);
    }
}
