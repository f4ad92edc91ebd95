//! Search and filtering over listings.
//!
//! The engine composes two independent predicates, a free-text filter and a
//! property-type filter, so each can be tested in isolation. Applying both
//! is commutative and always yields a subset of the input, ordered newest
//! first.

use crate::domain::listing::{Listing, PropertyType};

/// Composable listing filter built from query-string inputs.
///
/// The text query is normalised exactly once, in [`SearchFilter::new`]: an
/// absent query, a blank query, or the literal text `"none"` in any casing
/// disables the text predicate. Templating layers round-trip a missing query
/// parameter as the text `None`, and this constructor is the single place
/// that quirk is tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter {
    text: Option<String>,
    property_type: Option<PropertyType>,
}

impl SearchFilter {
    /// Build a filter from the raw text query and an optional property type.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::SearchFilter;
    ///
    /// assert_eq!(SearchFilter::new(Some("None"), None), SearchFilter::default());
    /// assert_eq!(SearchFilter::new(Some("  "), None), SearchFilter::default());
    /// assert!(SearchFilter::new(Some("pokhara"), None).text().is_some());
    /// ```
    pub fn new(query: Option<&str>, property_type: Option<PropertyType>) -> Self {
        let text = query
            .map(str::trim)
            .filter(|q| !q.is_empty() && !q.eq_ignore_ascii_case("none"))
            .map(str::to_lowercase);
        Self {
            text,
            property_type,
        }
    }

    /// The normalised lowercase needle, when a text filter is active.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The property-type filter, when one is active.
    pub const fn property_type(&self) -> Option<PropertyType> {
        self.property_type
    }

    /// Free-text predicate: OR across title, location, property type, and
    /// room type, matched by case-insensitive substring containment.
    pub fn matches_text(&self, listing: &Listing) -> bool {
        let Some(needle) = self.text.as_deref() else {
            return true;
        };
        listing.title().to_lowercase().contains(needle)
            || listing.location().as_str().to_lowercase().contains(needle)
            || listing
                .property_type()
                .as_str()
                .to_lowercase()
                .contains(needle)
            || listing.room_type().as_str().to_lowercase().contains(needle)
    }

    /// Property-type predicate: exact equality on the parsed enum.
    pub fn matches_property_type(&self, listing: &Listing) -> bool {
        self.property_type
            .is_none_or(|wanted| listing.property_type() == wanted)
    }

    /// Conjunction of the two predicates.
    pub fn matches(&self, listing: &Listing) -> bool {
        self.matches_text(listing) && self.matches_property_type(listing)
    }

    /// Filter the listings and order them `created_at` descending, ties
    /// broken by descending id so equal timestamps keep reverse insertion
    /// order.
    pub fn apply(&self, mut listings: Vec<Listing>) -> Vec<Listing> {
        listings.retain(|listing| self.matches(listing));
        listings.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        listings
    }
}
