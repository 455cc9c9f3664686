use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::clock::Clock;
use crate::db::{estimate_repo, item_repo, product_repo, token_repo, user_repo, Database};

use super::error::EstimateError;
use super::model::{
    Estimate, EstimateDetails, ItemRequest, LineItem, NewEstimate, PricedItem, QuantityUpdate,
};
use super::pricing::{EstimateTotals, PricingPolicy};
use super::status::{EstimateStatus, Transition};

/// Maximum number of estimates returned by a surveyor listing.
pub const LIST_LIMIT: u32 = 10;

/// Largest quantity accepted on a single line item.
pub const MAX_QUANTITY: i64 = 10_000;

/// An estimate with its line items and freshly computed totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedEstimate {
    pub estimate: Estimate,
    pub items: Vec<PricedItem>,
    pub totals: EstimateTotals,
}

/// Loads an estimate or fails with `NotFound`.
pub(crate) fn load(conn: &Connection, estimate_id: i64) -> Result<Estimate, EstimateError> {
    estimate_repo::get(conn, estimate_id)?.ok_or(EstimateError::NotFound { estimate_id })
}

pub(crate) fn priced_in(
    conn: &Connection,
    pricing: &PricingPolicy,
    estimate: Estimate,
) -> Result<PricedEstimate, EstimateError> {
    let items = item_repo::list_priced(conn, estimate.id)?;
    let totals = pricing.totals(&items);
    Ok(PricedEstimate {
        estimate,
        items,
        totals,
    })
}

/// Advances an estimate one step along the chain on the given connection.
///
/// Leaving Draft requires at least one line item. A terminal estimate is
/// returned unchanged. The write is conditional on the status read here, so
/// a concurrent advance surfaces as `StatusChanged` instead of skipping a step.
pub(crate) fn advance_in(
    conn: &Connection,
    estimate_id: i64,
) -> Result<Transition, EstimateError> {
    let estimate = load(conn, estimate_id)?;
    let from = estimate.status;

    if from == EstimateStatus::Draft && item_repo::count_for_estimate(conn, estimate_id)? == 0 {
        return Err(EstimateError::NoLineItems { estimate_id });
    }

    let to = from.next();
    if to == from {
        debug!(estimate_id, status = %from, "Estimate already terminal");
        return Ok(Transition {
            estimate_id,
            from,
            to,
        });
    }

    if !estimate_repo::update_status(conn, estimate_id, from, to)? {
        return Err(EstimateError::StatusChanged { estimate_id });
    }

    Ok(Transition {
        estimate_id,
        from,
        to,
    })
}

/// Rejects edits to anything other than a Draft estimate.
fn ensure_draft(estimate: &Estimate) -> Result<(), EstimateError> {
    if estimate.status != EstimateStatus::Draft {
        return Err(EstimateError::NotEditable {
            estimate_id: estimate.id,
            status: estimate.status,
        });
    }
    Ok(())
}

fn ensure_quantity(quantity: i64) -> Result<(), EstimateError> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(EstimateError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Loads a line item and checks it belongs to `estimate_id`.
fn load_item(
    conn: &Connection,
    estimate_id: i64,
    line_item_id: i64,
) -> Result<LineItem, EstimateError> {
    match item_repo::get(conn, line_item_id)? {
        Some(item) if item.estimate_id == estimate_id => Ok(item),
        _ => Err(EstimateError::LineItemNotFound { line_item_id }),
    }
}

/// Estimate CRUD, line items, priced views and the status machine.
#[derive(Clone)]
pub struct EstimateService {
    db: Database,
    clock: Arc<dyn Clock>,
    pricing: Arc<PricingPolicy>,
}

impl EstimateService {
    pub fn new(db: Database, clock: Arc<dyn Clock>, pricing: Arc<PricingPolicy>) -> Self {
        Self { db, clock, pricing }
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Creates a Draft estimate stamped with the current time.
    pub fn create(&self, new: NewEstimate) -> Result<Estimate, EstimateError> {
        let now = self.clock.now();
        let estimate = self.db.with_transaction(|tx| {
            let customer_id = new.details.customer_id;
            if user_repo::get(tx, customer_id)?.is_none() {
                return Err(EstimateError::CustomerNotFound { customer_id });
            }
            Ok(estimate_repo::insert(tx, &new, now)?)
        })?;

        info!(
            estimate_id = estimate.id,
            created_by = estimate.created_by,
            "Estimate created"
        );
        Ok(estimate)
    }

    pub fn get(&self, estimate_id: i64) -> Result<Estimate, EstimateError> {
        self.db.with_conn(|conn| load(conn, estimate_id))
    }

    /// The oldest estimates created by a surveyor, at most [`LIST_LIMIT`].
    pub fn list_for_creator(&self, created_by: i64) -> Result<Vec<Estimate>, EstimateError> {
        self.db
            .with_conn(|conn| Ok(estimate_repo::list_by_creator(conn, created_by, LIST_LIMIT)?))
    }

    /// Replaces dimensions, address and customer. Draft only.
    pub fn update_details(
        &self,
        estimate_id: i64,
        details: EstimateDetails,
    ) -> Result<Estimate, EstimateError> {
        self.db.with_transaction(|tx| {
            let estimate = load(tx, estimate_id)?;
            ensure_draft(&estimate)?;

            let customer_id = details.customer_id;
            if user_repo::get(tx, customer_id)?.is_none() {
                return Err(EstimateError::CustomerNotFound { customer_id });
            }

            estimate_repo::update_details(tx, estimate_id, &details)?;
            Ok(Estimate {
                details,
                ..estimate
            })
        })
    }

    /// Deletes an estimate with its items and tokens.
    ///
    /// Refused while a signing link for it is still redeemable.
    pub fn delete(&self, estimate_id: i64) -> Result<(), EstimateError> {
        let now = self.clock.now();
        self.db.with_transaction(|tx| {
            load(tx, estimate_id)?;
            if token_repo::has_outstanding(tx, estimate_id, now)? {
                return Err(EstimateError::OutstandingInvoice { estimate_id });
            }
            estimate_repo::delete(tx, estimate_id)?;
            Ok(())
        })?;

        info!(estimate_id, "Estimate deleted");
        Ok(())
    }

    /// Adds a product line to a Draft estimate.
    pub fn add_item(
        &self,
        estimate_id: i64,
        request: ItemRequest,
    ) -> Result<LineItem, EstimateError> {
        ensure_quantity(request.quantity)?;

        self.db.with_transaction(|tx| {
            let estimate = load(tx, estimate_id)?;
            ensure_draft(&estimate)?;

            let product_id = request.product_id;
            let product = product_repo::get(tx, product_id)?
                .ok_or(EstimateError::ProductNotFound { product_id })?;
            if !product.fits_through_doorway(&estimate.details.dimensions) {
                return Err(EstimateError::DoesNotFitDoorway { product_id });
            }

            let item = item_repo::insert(tx, estimate_id, product_id, request.quantity)?;
            debug!(
                estimate_id,
                line_item_id = item.id,
                product_id,
                quantity = item.quantity,
                "Line item added"
            );
            Ok(item)
        })
    }

    pub fn update_item_quantity(
        &self,
        estimate_id: i64,
        line_item_id: i64,
        update: QuantityUpdate,
    ) -> Result<LineItem, EstimateError> {
        ensure_quantity(update.quantity)?;

        self.db.with_transaction(|tx| {
            ensure_draft(&load(tx, estimate_id)?)?;
            let item = load_item(tx, estimate_id, line_item_id)?;
            item_repo::update_quantity(tx, line_item_id, update.quantity)?;
            Ok(LineItem {
                quantity: update.quantity,
                ..item
            })
        })
    }

    pub fn remove_item(&self, estimate_id: i64, line_item_id: i64) -> Result<(), EstimateError> {
        self.db.with_transaction(|tx| {
            ensure_draft(&load(tx, estimate_id)?)?;
            load_item(tx, estimate_id, line_item_id)?;
            item_repo::delete(tx, line_item_id)?;
            Ok(())
        })
    }

    /// The estimate with its items and totals computed from current prices.
    pub fn priced(&self, estimate_id: i64) -> Result<PricedEstimate, EstimateError> {
        self.db.with_conn(|conn| {
            let estimate = load(conn, estimate_id)?;
            priced_in(conn, &self.pricing, estimate)
        })
    }

    /// Moves the estimate to the next status in the chain.
    ///
    /// A Draft with items is refused with `InvoiceRequired`: it leaves Draft
    /// only through `InvoiceService::issue`, which mints and mails the link.
    pub fn advance(&self, estimate_id: i64) -> Result<Transition, EstimateError> {
        let _span = info_span!("estimate.advance", estimate_id).entered();

        let transition = self.db.with_transaction(|tx| {
            let estimate = load(tx, estimate_id)?;
            if estimate.status == EstimateStatus::Draft
                && item_repo::count_for_estimate(tx, estimate_id)? > 0
            {
                return Err(EstimateError::InvoiceRequired { estimate_id });
            }
            advance_in(tx, estimate_id)
        })?;

        if !transition.is_noop() {
            info!(from = %transition.from, to = %transition.to, "Estimate advanced");
        }
        Ok(transition)
    }
}
