//! Estimates: records, the lifecycle state machine and pricing.

pub mod error;
pub mod model;
pub mod pricing;
pub mod service;
pub mod status;

pub use error::EstimateError;
pub use model::{
    Address, Estimate, EstimateDetails, ItemRequest, KitchenDimensions, LineItem, NewEstimate,
    NewProduct, NewUser, PricedItem, Product, ProductFilter, QuantityUpdate, Role, User,
};
pub use pricing::{EstimateTotals, LaborRule, PricingPolicy};
pub use service::{EstimateService, PricedEstimate, LIST_LIMIT, MAX_QUANTITY};
pub use status::{EstimateStatus, Transition};
