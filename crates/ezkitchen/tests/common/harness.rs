//! Test harness wiring an `Application` to in-process collaborators.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use secrecy::ExposeSecret;

use ezkitchen::db::{product_repo, user_repo, Database, DatabaseError};
use ezkitchen::estimate::{ItemRequest, PricingPolicy, Role};
use ezkitchen::invoice::{InvoiceSettings, IssuedInvoice};
use ezkitchen::mailer::RecordingMailer;
use ezkitchen::storage::MemoryObjectStore;
use ezkitchen::{Application, Clock, FixedClock};

use super::builders::{new_estimate, user, ProductBuilder};

pub const BASE_URL: &str = "https://ezkitchen.test";

/// Catalog rows seeded into every harness.
pub struct Catalog {
    /// Countertops, 10000 cents.
    pub countertop: i64,
    /// Appliances, 150000 cents.
    pub range: i64,
    /// Cabinetry, 25000 cents.
    pub cabinet: i64,
    /// Lighting has no labor rule.
    pub pendant: i64,
    /// Too tall for a standard doorway.
    pub walk_in_cooler: i64,
}

pub struct TestHarness {
    pub app: Application,
    pub db: Database,
    pub store: Arc<MemoryObjectStore>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: Arc<FixedClock>,
    pub surveyor_id: i64,
    pub customer_id: i64,
    pub catalog: Catalog,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let store = Arc::new(MemoryObjectStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap(),
        ));

        let now = clock.now();
        let (surveyor_id, customer_id, catalog) = db
            .with_conn(|conn| {
                let surveyor = user_repo::insert(conn, &user("Sam", Role::Surveyor), now)?;
                let customer = user_repo::insert(conn, &user("Cora", Role::Customer), now)?;
                let catalog = Catalog {
                    countertop: product_repo::insert(
                        conn,
                        &ProductBuilder::new("Quartz Slab", "Countertops").build(),
                    )?
                    .id,
                    range: product_repo::insert(
                        conn,
                        &ProductBuilder::new("Gas Range", "Appliances")
                            .price(150_000)
                            .size(30.0, 28.0, 36.0)
                            .build(),
                    )?
                    .id,
                    cabinet: product_repo::insert(
                        conn,
                        &ProductBuilder::new("Base Cabinet", "Cabinetry")
                            .price(25_000)
                            .build(),
                    )?
                    .id,
                    pendant: product_repo::insert(
                        conn,
                        &ProductBuilder::new("Pendant Light", "Lighting")
                            .price(4_500)
                            .build(),
                    )?
                    .id,
                    walk_in_cooler: product_repo::insert(
                        conn,
                        &ProductBuilder::new("Walk-in Cooler", "Appliances")
                            .size(96.0, 96.0, 90.0)
                            .build(),
                    )?
                    .id,
                };
                Ok::<_, DatabaseError>((surveyor.id, customer.id, catalog))
            })
            .expect("Failed to seed harness data");

        let app = Application::new(
            db.clone(),
            store.clone(),
            mailer.clone(),
            clock.clone(),
            PricingPolicy::default(),
            InvoiceSettings::new(BASE_URL),
        );

        Self {
            app,
            db,
            store,
            mailer,
            clock,
            surveyor_id,
            customer_id,
            catalog,
        }
    }

    /// Creates a Draft estimate for the seeded customer.
    pub fn draft(&self) -> i64 {
        self.app
            .estimates()
            .create(new_estimate(self.surveyor_id, self.customer_id))
            .expect("Failed to create estimate")
            .id
    }

    pub fn add(&self, estimate_id: i64, product_id: i64, quantity: i64) -> i64 {
        self.app
            .estimates()
            .add_item(
                estimate_id,
                ItemRequest {
                    product_id,
                    quantity,
                },
            )
            .expect("Failed to add line item")
            .id
    }

    /// A Draft estimate holding two countertop units.
    pub fn draft_with_countertops(&self) -> i64 {
        let id = self.draft();
        self.add(id, self.catalog.countertop, 2);
        id
    }

    /// Issues the estimate's invoice and returns the raw token.
    pub async fn issue(&self, estimate_id: i64) -> (IssuedInvoice, String) {
        let issued = self
            .app
            .invoices()
            .issue(estimate_id)
            .await
            .expect("Failed to issue invoice");
        let raw = raw_token(&issued);
        (issued, raw)
    }
}

pub fn raw_token(issued: &IssuedInvoice) -> String {
    let url = issued.signing_url.expose_secret();
    url.split_once("token=")
        .map(|(_, token)| token.to_string())
        .expect("signing URL carries a token")
}
