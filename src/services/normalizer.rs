//! Record normalizer.
//!
//! Upstream sources deliver property records in three incompatible shapes.
//! [`classify`] decides which shape a raw record is by key inspection alone,
//! then a per-shape mapping function builds the canonical [`Property`].
//!
//! Shapes, checked in priority order:
//! - **Rich**: the backend shape, keyed by `idProperty`, optionally carrying
//!   nested `images[]`, `owner{}` and `traces[]`.
//! - **Flat**: the mock-data shape with `name`, `address` and `city`.
//! - **Generic**: anything else carrying at least an id, name, address and price.
//!
//! Normalization is pure: the same raw record and clock always produce the
//! same entity.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Map, Value};

use crate::domain::errors::{StoreError, StoreResult};
use crate::domain::models::{
    AreaUnit, ImageRef, Location, OwnerSummary, Property, PropertyCategory, PropertyImage,
    PropertyStatus, PropertyTrace,
};

const RICH_ID_KEYS: &[&str] = &["idProperty", "IdProperty", "id_property", "propertyId"];
const GENERIC_ID_KEYS: &[&str] = &["id", "Id", "_id", "uuid"];
const NAME_KEYS: &[&str] = &["name", "Name", "title"];
const ADDRESS_KEYS: &[&str] = &["address", "Address"];
const CITY_KEYS: &[&str] = &["city", "City"];
const PRICE_KEYS: &[&str] = &["price", "Price"];
const DESCRIPTION_KEYS: &[&str] = &["description", "Description"];
const CURRENCY_KEYS: &[&str] = &["currency", "Currency"];
const CATEGORY_KEYS: &[&str] = &["category", "propertyType", "type", "Type"];
const AREA_KEYS: &[&str] = &["area", "Area", "size", "sqft"];
const AREA_UNIT_KEYS: &[&str] = &["areaUnit", "area_unit", "unit"];
const STATUS_KEYS: &[&str] = &["status", "Status"];
const CREATED_KEYS: &[&str] = &["createdAt", "created_at"];
const UPDATED_KEYS: &[&str] = &["updatedAt", "updated_at"];
const YEAR_KEYS: &[&str] = &["yearBuilt", "year_built", "year", "Year"];
const DEFAULT_CURRENCY: &str = "USD";

/// Which upstream shape a raw record arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordShape {
    Rich,
    Flat,
    Generic,
}

impl RecordShape {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rich => "rich",
            Self::Flat => "flat",
            Self::Generic => "generic",
        }
    }

    /// Minimal raw record carrying the keys that select this shape for `property`.
    pub fn identifying_record(&self, property: &Property) -> Value {
        match self {
            Self::Rich => json!({ "idProperty": property.id }),
            Self::Flat => json!({
                "id": property.id,
                "name": property.name,
                "address": property.location.to_string(),
                "city": "",
            }),
            Self::Generic => json!({
                "id": property.id,
                "name": property.name,
                "address": property.location.to_string(),
                "price": property.price,
            }),
        }
    }
}

/// Decide the shape of a raw record by key presence.
pub fn classify(raw: &Value) -> RecordShape {
    let Some(obj) = raw.as_object() else {
        return RecordShape::Generic;
    };

    if has_any(obj, RICH_ID_KEYS) {
        RecordShape::Rich
    } else if has_any(obj, NAME_KEYS) && has_any(obj, ADDRESS_KEYS) && has_any(obj, CITY_KEYS) {
        RecordShape::Flat
    } else {
        RecordShape::Generic
    }
}

/// Normalize a raw record using the current time for missing timestamps.
pub fn normalize(raw: &Value) -> StoreResult<Property> {
    normalize_at(raw, Utc::now())
}

/// Normalize a raw record, using `now` wherever a timestamp is missing.
pub fn normalize_at(raw: &Value, now: DateTime<Utc>) -> StoreResult<Property> {
    let obj = raw
        .as_object()
        .ok_or_else(|| StoreError::MalformedRecord("record is not a JSON object".to_string()))?;

    let mut property = match classify(raw) {
        RecordShape::Rich => from_rich(obj, now)?,
        RecordShape::Flat => from_flat(obj, now)?,
        RecordShape::Generic => from_generic(obj, now)?,
    };

    // A record that claims it was updated before it existed is clamped.
    if property.updated_at < property.created_at {
        property.updated_at = property.created_at;
    }
    Ok(property)
}

/// Identifier a raw record would normalize to, without normalizing it.
pub fn record_id(raw: &Value) -> Option<String> {
    let obj = raw.as_object()?;
    let keys = match classify(raw) {
        RecordShape::Rich => RICH_ID_KEYS,
        RecordShape::Flat | RecordShape::Generic => GENERIC_ID_KEYS,
    };
    string_field(obj, keys).filter(|id| !id.is_empty())
}

fn from_rich(obj: &Map<String, Value>, now: DateTime<Utc>) -> StoreResult<Property> {
    let id = string_field(obj, RICH_ID_KEYS)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::MalformedRecord("rich record has an empty idProperty".to_string()))?;

    let location = match field(obj, &["location", "Location"]) {
        Some(Value::Object(_)) => field(obj, &["location", "Location"])
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default(),
        Some(Value::String(text)) => Location::Text(text.clone()),
        _ => join_location(
            string_field(obj, ADDRESS_KEYS).unwrap_or_default(),
            string_field(obj, CITY_KEYS),
        ),
    };

    let images = match field(obj, &["images", "Images"]) {
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| image_ref(item, &id, index))
            .collect(),
        _ => string_field(obj, &["image", "Image", "file", "File"])
            .map(|url| {
                vec![ImageRef::Record(PropertyImage {
                    id: format!("{id}-image-0"),
                    parent_id: id.clone(),
                    url,
                    enabled: true,
                })]
            })
            .unwrap_or_default(),
    };

    let owner = match field(obj, &["owner", "Owner"]) {
        Some(Value::Object(owner)) => Some(OwnerSummary {
            id: string_field(owner, &["idOwner", "IdOwner", "id"]).unwrap_or_default(),
            name: string_field(owner, NAME_KEYS).unwrap_or_default(),
            address: string_field(owner, ADDRESS_KEYS),
            photo: string_field(owner, &["photo", "Photo"]),
            birthday: string_field(owner, &["birthday", "Birthday"]),
        }),
        _ => None,
    };

    let traces = match field(obj, &["traces", "Traces"]) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|trace| PropertyTrace {
                id: string_field(trace, &["idPropertyTrace", "IdPropertyTrace", "id"])
                    .unwrap_or_default(),
                date_sale: string_field(trace, &["dateSale", "DateSale"]),
                name: string_field(trace, NAME_KEYS).unwrap_or_default(),
                value: number_field(trace, &["value", "Value"]).unwrap_or(0.0),
                tax: number_field(trace, &["tax", "Tax"]).unwrap_or(0.0),
            })
            .collect(),
        _ => Vec::new(),
    };

    let created_at = timestamp_field(obj, CREATED_KEYS).unwrap_or(now);
    Ok(Property {
        name: string_field(obj, NAME_KEYS).unwrap_or_default(),
        description: string_field(obj, DESCRIPTION_KEYS).unwrap_or_default(),
        price: number_field(obj, PRICE_KEYS).unwrap_or(0.0),
        currency: string_field(obj, CURRENCY_KEYS).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        location,
        category: string_field(obj, CATEGORY_KEYS)
            .and_then(|value| PropertyCategory::from_str(&value))
            .unwrap_or_default(),
        area: number_field(obj, AREA_KEYS).unwrap_or(0.0),
        area_unit: string_field(obj, AREA_UNIT_KEYS)
            .map_or(AreaUnit::SquareMeters, |marker| area_unit(&marker)),
        bedrooms: count_field(obj, &["bedrooms", "Bedrooms"]),
        bathrooms: count_field(obj, &["bathrooms", "Bathrooms"]),
        features: string_list(obj, &["features", "Features"]),
        images,
        status: status(obj),
        created_at,
        updated_at: timestamp_field(obj, UPDATED_KEYS).unwrap_or(created_at),
        year_built: year(obj),
        owner,
        traces,
        id,
    })
}

fn from_flat(obj: &Map<String, Value>, now: DateTime<Utc>) -> StoreResult<Property> {
    let id = required_id(obj, "flat")?;
    let name = string_field(obj, NAME_KEYS).unwrap_or_default();
    let address = string_field(obj, ADDRESS_KEYS).unwrap_or_default();
    let city = string_field(obj, CITY_KEYS).unwrap_or_default();
    let kind = string_field(obj, CATEGORY_KEYS).unwrap_or_else(|| "Property".to_string());

    let mut description = format!("{kind} located at {address}, {city}");
    if let Some(extra) = string_field(obj, DESCRIPTION_KEYS).filter(|text| !text.is_empty()) {
        description.push_str(". ");
        description.push_str(&extra);
    }

    let mut images: Vec<ImageRef> = string_list(obj, &["images"])
        .into_iter()
        .map(ImageRef::Url)
        .collect();
    if images.is_empty() {
        images.extend(string_field(obj, &["image"]).map(ImageRef::Url));
    }

    let created_at = timestamp_field(obj, CREATED_KEYS).unwrap_or(now);
    Ok(Property {
        id,
        name,
        description,
        price: number_field(obj, PRICE_KEYS).unwrap_or(0.0),
        currency: string_field(obj, CURRENCY_KEYS).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        location: Location::Text(format!("{address}, {city}")),
        category: flat_category(&kind),
        area: number_field(obj, AREA_KEYS).unwrap_or(0.0),
        area_unit: string_field(obj, AREA_UNIT_KEYS)
            .map_or(AreaUnit::SquareFeet, |marker| area_unit(&marker)),
        bedrooms: count_field(obj, &["bedrooms", "beds"]),
        bathrooms: count_field(obj, &["bathrooms", "baths"]),
        features: string_list(obj, &["features", "amenities"]),
        images,
        status: status(obj),
        created_at,
        updated_at: timestamp_field(obj, UPDATED_KEYS).unwrap_or(created_at),
        year_built: year(obj),
        owner: None,
        traces: Vec::new(),
    })
}

fn from_generic(obj: &Map<String, Value>, now: DateTime<Utc>) -> StoreResult<Property> {
    let id = required_id(obj, "generic")?;
    let name = string_field(obj, NAME_KEYS)
        .ok_or_else(|| StoreError::MalformedRecord(format!("record {id} has no name")))?;
    let address = string_field(obj, ADDRESS_KEYS)
        .ok_or_else(|| StoreError::MalformedRecord(format!("record {id} has no address")))?;
    let price = number_field(obj, PRICE_KEYS)
        .ok_or_else(|| StoreError::MalformedRecord(format!("record {id} has no price")))?;

    let created_at = timestamp_field(obj, CREATED_KEYS).unwrap_or(now);
    Ok(Property {
        id,
        name,
        description: string_field(obj, DESCRIPTION_KEYS).unwrap_or_default(),
        price,
        currency: string_field(obj, CURRENCY_KEYS).unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        location: Location::Text(address),
        category: string_field(obj, CATEGORY_KEYS)
            .and_then(|value| PropertyCategory::from_str(&value))
            .unwrap_or_default(),
        area: number_field(obj, AREA_KEYS).unwrap_or(0.0),
        area_unit: string_field(obj, AREA_UNIT_KEYS)
            .map_or(AreaUnit::SquareMeters, |marker| area_unit(&marker)),
        bedrooms: count_field(obj, &["bedrooms"]),
        bathrooms: count_field(obj, &["bathrooms"]),
        features: string_list(obj, &["features"]),
        images: string_list(obj, &["images"])
            .into_iter()
            .map(ImageRef::Url)
            .collect(),
        status: status(obj),
        created_at,
        updated_at: timestamp_field(obj, UPDATED_KEYS).unwrap_or(created_at),
        year_built: year(obj),
        owner: None,
        traces: Vec::new(),
    })
}

/// Category lookup used by the flat mock shape.
fn flat_category(kind: &str) -> PropertyCategory {
    match kind {
        "Apartment" | "Condo" | "Studio" => PropertyCategory::Apartment,
        _ => PropertyCategory::House,
    }
}

fn area_unit(marker: &str) -> AreaUnit {
    match marker.trim() {
        "m²" | "m2" | "sqm" => AreaUnit::SquareMeters,
        _ => AreaUnit::SquareFeet,
    }
}

fn status(obj: &Map<String, Value>) -> PropertyStatus {
    string_field(obj, STATUS_KEYS)
        .and_then(|value| PropertyStatus::from_str(&value))
        .unwrap_or_default()
}

fn year(obj: &Map<String, Value>) -> Option<i32> {
    number_field(obj, YEAR_KEYS)
        .filter(|year| year.fract() == 0.0 && *year >= f64::from(i32::MIN) && *year <= f64::from(i32::MAX))
        .map(|year| year as i32)
}

fn join_location(address: String, city: Option<String>) -> Location {
    match city.filter(|city| !city.is_empty()) {
        Some(city) if !address.is_empty() => Location::Text(format!("{address}, {city}")),
        Some(city) => Location::Text(city),
        None => Location::Text(address),
    }
}

fn image_ref(item: &Value, property_id: &str, index: usize) -> Option<ImageRef> {
    match item {
        Value::String(url) => Some(ImageRef::Url(url.clone())),
        Value::Object(image) => {
            let url = string_field(image, &["url", "file", "File", "src"])?;
            Some(ImageRef::Record(PropertyImage {
                id: string_field(image, &["idPropertyImage", "IdPropertyImage", "id"])
                    .unwrap_or_else(|| format!("{property_id}-image-{index}")),
                parent_id: string_field(image, RICH_ID_KEYS)
                    .unwrap_or_else(|| property_id.to_string()),
                url,
                enabled: field(image, &["enabled", "Enabled"])
                    .and_then(Value::as_bool)
                    .unwrap_or(true),
            }))
        }
        _ => None,
    }
}

fn required_id(obj: &Map<String, Value>, shape: &str) -> StoreResult<String> {
    string_field(obj, GENERIC_ID_KEYS)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| StoreError::MalformedRecord(format!("{shape} record has no identifier")))
}

fn has_any(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| obj.contains_key(*key))
}

/// First non-null value among `keys`.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

/// Strings are taken as-is, numbers and booleans are rendered.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(obj, keys)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Numbers, or strings such as `"$1,250,000"`.
fn number_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    match field(obj, keys)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .trim_start_matches('$')
                .chars()
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

fn count_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<u32> {
    number_field(obj, keys)
        .filter(|count| count.is_finite() && *count >= 0.0 && count.fract() == 0.0)
        .and_then(|count| u32::try_from(count as u64).ok())
}

fn string_list(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    match field(obj, keys) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn timestamp_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    let text = field(obj, keys)?.as_str()?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
