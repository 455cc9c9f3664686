//! Builders for test records.

#![allow(dead_code)]

use ezkitchen::estimate::{
    Address, EstimateDetails, KitchenDimensions, NewEstimate, NewProduct, NewUser, Role,
};
use ezkitchen::invoice::SignatureUpload;

/// Builder for catalog products.
pub struct ProductBuilder {
    product: NewProduct,
}

impl ProductBuilder {
    pub fn new(name: &str, category: &str) -> Self {
        Self {
            product: NewProduct {
                name: name.to_string(),
                description: format!("{} for integration tests", name),
                category: category.to_string(),
                subcategory: String::new(),
                color: "White".to_string(),
                unit_price_cents: 10_000,
                length_inch: 24.0,
                width_inch: 24.0,
                height_inch: 2.0,
                created_by: None,
            },
        }
    }

    pub fn price(mut self, cents: i64) -> Self {
        self.product.unit_price_cents = cents;
        self
    }

    pub fn size(mut self, length: f32, width: f32, height: f32) -> Self {
        self.product.length_inch = length;
        self.product.width_inch = width;
        self.product.height_inch = height;
        self
    }

    pub fn build(self) -> NewProduct {
        self.product
    }
}

pub fn user(name: &str, role: Role) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: "555-0100".to_string(),
        role,
    }
}

/// A standard 36x80 inch doorway.
pub fn dimensions() -> KitchenDimensions {
    KitchenDimensions {
        kitchen_length_inch: 144.0,
        kitchen_width_inch: 120.0,
        kitchen_height_inch: 96.0,
        door_width_inch: 36.0,
        door_height_inch: 80.0,
    }
}

pub fn new_estimate(created_by: i64, customer_id: i64) -> NewEstimate {
    NewEstimate {
        created_by,
        details: EstimateDetails {
            customer_id,
            dimensions: dimensions(),
            address: Address {
                street: "12 Birch Lane".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip: "62701".to_string(),
            },
        },
    }
}

/// A PNG-typed upload of `kib` KiB.
pub fn signature_of_kib(kib: usize) -> SignatureUpload {
    SignatureUpload::new(vec![0x89; kib * 1024], "image/png")
}
