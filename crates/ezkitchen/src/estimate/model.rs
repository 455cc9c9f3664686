//! Estimate, line item and catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::EstimateError;
use super::status::EstimateStatus;

/// Doorway clearance tolerance in inches.
const DOORWAY_TOLERANCE_INCH: f32 = 1.0;

/// Measured kitchen and doorway dimensions, in inches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KitchenDimensions {
    pub kitchen_length_inch: f32,
    pub kitchen_width_inch: f32,
    pub kitchen_height_inch: f32,
    pub door_width_inch: f32,
    pub door_height_inch: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// The editable part of an estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateDetails {
    pub customer_id: i64,
    pub dimensions: KitchenDimensions,
    pub address: Address,
}

/// Input for creating an estimate. New estimates always start in Draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEstimate {
    /// Surveyor who created the estimate.
    pub created_by: i64,
    pub details: EstimateDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    pub id: i64,
    pub created_by: i64,
    pub status: EstimateStatus,
    pub created_at: DateTime<Utc>,
    pub details: EstimateDetails,
    /// Object key of the customer's signature; set at most once.
    pub signature_object_key: Option<String>,
}

impl Estimate {
    pub fn is_signed(&self) -> bool {
        self.signature_object_key.is_some()
    }

    pub fn customer_id(&self) -> i64 {
        self.details.customer_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub color: String,
    pub unit_price_cents: i64,
    pub length_inch: f32,
    pub width_inch: f32,
    pub height_inch: f32,
    pub created_by: Option<i64>,
}

impl Product {
    /// Whether the product can be carried through the estimate's doorway in
    /// at least one orientation, allowing one inch of tolerance.
    pub fn fits_through_doorway(&self, dims: &KitchenDimensions) -> bool {
        let door_w = dims.door_width_inch + DOORWAY_TOLERANCE_INCH;
        let door_h = dims.door_height_inch + DOORWAY_TOLERANCE_INCH;

        (self.width_inch <= door_w && self.height_inch <= door_h)
            || (self.length_inch <= door_w && self.height_inch <= door_h)
            || (self.width_inch <= door_h && self.length_inch <= door_w)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub color: String,
    pub unit_price_cents: i64,
    pub length_inch: f32,
    pub width_inch: f32,
    pub height_inch: f32,
    pub created_by: Option<i64>,
}

/// Optional catalog filters; `None` matches anything.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Surveyor,
    Customer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Surveyor => "SURVEYOR",
            Role::Customer => "CUSTOMER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Role::Admin),
            "SURVEYOR" => Some(Role::Surveyor),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub id: i64,
    pub estimate_id: i64,
    pub product_id: i64,
    pub quantity: i64,
}

/// A line item joined with the product it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedItem {
    pub line_item_id: i64,
    pub product: Product,
    pub quantity: i64,
}

/// Body of an add-item request.
///
/// Decoding is strict: unknown or missing fields reject the request instead
/// of defaulting to zero values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

impl ItemRequest {
    pub fn decode(body: &[u8]) -> Result<Self, EstimateError> {
        serde_json::from_slice(body).map_err(|e| EstimateError::MalformedRequest(e.to_string()))
    }
}

/// Body of an update-quantity request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

impl QuantityUpdate {
    pub fn decode(body: &[u8]) -> Result<Self, EstimateError> {
        serde_json::from_slice(body).map_err(|e| EstimateError::MalformedRequest(e.to_string()))
    }
}
