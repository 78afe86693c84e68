//! Canonical property entity.
//!
//! Every upstream record shape is normalized into [`Property`] before it is
//! allowed into the store. Embedded owner and trace data are value copies
//! taken at ingestion time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::filter::EXPENSIVE_THRESHOLD;
use crate::domain::errors::{StoreError, StoreResult};

/// Property category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyCategory {
    Apartment,
    House,
    Commercial,
    Land,
}

impl Default for PropertyCategory {
    fn default() -> Self {
        Self::House
    }
}

impl PropertyCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Commercial => "commercial",
            Self::Land => "land",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "apartment" => Some(Self::Apartment),
            "house" => Some(Self::House),
            "commercial" => Some(Self::Commercial),
            "land" => Some(Self::Land),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit the `area` field is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaUnit {
    #[serde(rename = "m²")]
    SquareMeters,
    #[serde(rename = "sqft")]
    SquareFeet,
}

impl Default for AreaUnit {
    fn default() -> Self {
        Self::SquareMeters
    }
}

impl AreaUnit {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SquareMeters => "m²",
            Self::SquareFeet => "sqft",
        }
    }
}

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Sold,
    Rented,
}

impl Default for PropertyStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl PropertyStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Sold => "sold",
            Self::Rented => "rented",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "sold" => Some(Self::Sold),
            "rented" => Some(Self::Rented),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image record as delivered by the rich backend shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyImage {
    pub id: String,
    pub parent_id: String,
    pub url: String,
    pub enabled: bool,
}

/// An image reference: either a bare URL or a full image record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Record(PropertyImage),
}

impl ImageRef {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Record(image) => &image.url,
        }
    }

    /// Bare URLs carry no flag and are always displayable.
    pub const fn is_enabled(&self) -> bool {
        match self {
            Self::Url(_) => true,
            Self::Record(image) => image.enabled,
        }
    }
}

/// Structured postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Where a property is: free text or a structured address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Location {
    Text(String),
    Address(Address),
}

impl Default for Location {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Address(address) => {
                let parts: Vec<&str> = std::iter::once(address.street.as_str())
                    .chain(address.city.as_deref())
                    .chain(address.state.as_deref())
                    .chain(address.postal_code.as_deref())
                    .chain(address.country.as_deref())
                    .filter(|part| !part.is_empty())
                    .collect();
                f.write_str(&parts.join(", "))
            }
        }
    }
}

/// Owner summary embedded in a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}

/// A past sale or transfer of the property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyTrace {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_sale: Option<String>,
    pub name: String,
    pub value: f64,
    pub tax: f64,
}

/// The canonical property entity held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    /// Unique, immutable identifier
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// ISO currency code
    pub currency: String,
    pub location: Location,
    pub category: PropertyCategory,
    pub area: f64,
    pub area_unit: AreaUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Ingestion order is preserved; disabled images stay in the list
    #[serde(default)]
    pub images: Vec<ImageRef>,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerSummary>,
    #[serde(default)]
    pub traces: Vec<PropertyTrace>,
}

impl Property {
    /// Create a property with the given identity and defaults for everything else.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            price,
            currency: "USD".to_string(),
            location: Location::default(),
            category: PropertyCategory::default(),
            area: 0.0,
            area_unit: AreaUnit::default(),
            bedrooms: None,
            bathrooms: None,
            features: Vec::new(),
            images: Vec::new(),
            status: PropertyStatus::default(),
            created_at: now,
            updated_at: now,
            year_built: None,
            owner: None,
            traces: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: PropertyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: PropertyCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == PropertyStatus::Available
    }

    pub fn is_expensive(&self) -> bool {
        self.price > EXPENSIVE_THRESHOLD
    }

    /// Images eligible for display, in ingestion order.
    pub fn enabled_images(&self) -> impl Iterator<Item = &ImageRef> {
        self.images.iter().filter(|image| image.is_enabled())
    }

    /// Bump `updated_at`, never moving it before `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Check the entity-level invariants.
    pub fn validate(&self) -> StoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(StoreError::ValidationFailed(
                "property id cannot be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(StoreError::ValidationFailed(format!(
                "property {} has invalid price {}",
                self.id, self.price
            )));
        }
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(StoreError::ValidationFailed(format!(
                "property {} has invalid area {}",
                self.id, self.area
            )));
        }
        if self.updated_at < self.created_at {
            return Err(StoreError::ValidationFailed(format!(
                "property {} was updated before it was created",
                self.id
            )));
        }
        Ok(())
    }
}

/// Caller-supplied attributes for a create or update request.
///
/// The identifier is never part of a draft: it comes from the backing
/// service on create and from the target on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub category: PropertyCategory,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub area_unit: AreaUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    #[serde(default)]
    pub status: PropertyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PropertyDraft {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price,
            currency: default_currency(),
            location: Location::default(),
            category: PropertyCategory::default(),
            area: 0.0,
            area_unit: AreaUnit::default(),
            bedrooms: None,
            bathrooms: None,
            features: Vec::new(),
            images: Vec::new(),
            status: PropertyStatus::default(),
            year_built: None,
        }
    }

    pub fn with_status(mut self, status: PropertyStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_category(mut self, category: PropertyCategory) -> Self {
        self.category = category;
        self
    }

    /// Reject drafts a listing form would never submit.
    pub fn validate(&self) -> StoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(StoreError::ValidationFailed(
                "property name cannot be empty".to_string(),
            ));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(StoreError::ValidationFailed(format!(
                "price must be positive, got {}",
                self.price
            )));
        }
        if !self.area.is_finite() || self.area < 0.0 {
            return Err(StoreError::ValidationFailed(format!(
                "area cannot be negative, got {}",
                self.area
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Property {
        Property::new("p-1", "Loft", 250_000.0, Utc::now())
    }

    #[test]
    fn test_enabled_images_keeps_order_and_skips_disabled() {
        let mut property = sample();
        property.images = vec![
            ImageRef::Url("a.jpg".to_string()),
            ImageRef::Record(PropertyImage {
                id: "i-2".to_string(),
                parent_id: "p-1".to_string(),
                url: "b.jpg".to_string(),
                enabled: false,
            }),
            ImageRef::Record(PropertyImage {
                id: "i-3".to_string(),
                parent_id: "p-1".to_string(),
                url: "c.jpg".to_string(),
                enabled: true,
            }),
        ];

        let urls: Vec<&str> = property.enabled_images().map(ImageRef::url).collect();
        assert_eq!(urls, vec!["a.jpg", "c.jpg"]);
        assert_eq!(property.images.len(), 3);
    }

    #[test]
    fn test_touch_never_precedes_creation() {
        let mut property = sample();
        let earlier = property.created_at - chrono::Duration::days(1);
        property.touch(earlier);
        assert_eq!(property.updated_at, property.created_at);
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let mut property = sample();
        property.price = -1.0;
        assert!(matches!(
            property.validate(),
            Err(StoreError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_draft_requires_positive_price() {
        assert!(PropertyDraft::new("Cabin", 0.0).validate().is_err());
        assert!(PropertyDraft::new("Cabin", 10.0).validate().is_ok());
        assert!(PropertyDraft::new("  ", 10.0).validate().is_err());
    }

    #[test]
    fn test_address_display_skips_missing_parts() {
        let location = Location::Address(Address {
            street: "12 Elm St".to_string(),
            city: Some("Springfield".to_string()),
            state: None,
            postal_code: Some("12345".to_string()),
            country: None,
        });
        assert_eq!(location.to_string(), "12 Elm St, Springfield, 12345");
    }

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!(
            PropertyCategory::from_str("Apartment"),
            Some(PropertyCategory::Apartment)
        );
        assert_eq!(PropertyCategory::from_str("castle"), None);
    }

    #[test]
    fn test_serialized_shape_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("areaUnit").is_some());
        assert_eq!(json["areaUnit"], "m²");
        assert_eq!(json["category"], "house");
    }
}
