//! Wires the services together from an [`AppConfig`].

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::{AppConfig, MailerConfig, MailerKind};
use crate::db::Database;
use crate::error::{ConfigError, Result};
use crate::estimate::{EstimateService, EstimateStatus, PricingPolicy, Transition};
use crate::invoice::{InvoiceService, InvoiceSettings, IssuedInvoice};
use crate::mailer::{LogMailer, Mailer, WebhookMailer};
use crate::secrets::expand_home;
use crate::storage::{FileObjectStore, ObjectStore};

/// Outcome of [`Application::progress`].
#[derive(Debug)]
pub enum Progression {
    /// The estimate left Draft and a signing link was mailed.
    InvoiceIssued(IssuedInvoice),
    Advanced(Transition),
}

pub struct Application {
    db: Database,
    estimates: EstimateService,
    invoices: InvoiceService,
}

fn build_mailer(config: &MailerConfig) -> Result<Arc<dyn Mailer>> {
    match config.kind {
        MailerKind::Log => Ok(Arc::new(LogMailer::new(config.from.clone()))),
        MailerKind::Webhook => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| ConfigError::Validation {
                    message: "mailer.endpoint is required for the webhook mailer".to_string(),
                })?;
            let api_key = config.api_key_source().resolve_optional()?;
            Ok(Arc::new(WebhookMailer::new(
                endpoint,
                config.from.clone(),
                api_key,
            )?))
        }
    }
}

impl Application {
    /// Opens the database, runs migrations and builds every collaborator.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let database_path = expand_home(&config.database.path);
        let storage_root = expand_home(&config.storage.root);
        let db = Database::open(Path::new(&database_path))?;
        let store: Arc<dyn ObjectStore> = Arc::new(FileObjectStore::new(&storage_root));
        let mailer = build_mailer(&config.mailer)?;
        let pricing = config.pricing.policy()?;

        info!(
            database = %database_path,
            storage = %storage_root,
            mailer = ?config.mailer.kind,
            "Application configured"
        );

        Ok(Self::new(
            db,
            store,
            mailer,
            Arc::new(SystemClock),
            pricing,
            config.invoice.settings(),
        ))
    }

    /// Builds the application from explicit collaborators.
    pub fn new(
        db: Database,
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        pricing: PricingPolicy,
        settings: InvoiceSettings,
    ) -> Self {
        let pricing = Arc::new(pricing);
        let estimates = EstimateService::new(db.clone(), clock.clone(), pricing.clone());
        let invoices = InvoiceService::new(db.clone(), store, mailer, clock, pricing, settings);
        Self {
            db,
            estimates,
            invoices,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn estimates(&self) -> &EstimateService {
        &self.estimates
    }

    pub fn invoices(&self) -> &InvoiceService {
        &self.invoices
    }

    /// Moves an estimate one step forward.
    ///
    /// Leaving Draft goes through invoice issuance so the customer always
    /// receives a signing link; later steps are plain status advances.
    pub async fn progress(&self, estimate_id: i64) -> Result<Progression> {
        let estimate = self.estimates.get(estimate_id)?;
        if estimate.status == EstimateStatus::Draft {
            let issued = self.invoices.issue(estimate_id).await?;
            return Ok(Progression::InvoiceIssued(issued));
        }
        Ok(Progression::Advanced(self.estimates.advance(estimate_id)?))
    }
}
