//! Shared application state.
//!
//! `CoreState` owns the reference data, the medication catalog and the
//! fitted disease model. It is built once at startup and shared with the
//! axum handlers through an `Arc`. Nothing in it changes after startup
//! except the in-memory access log.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::config::ServerConfig;
use crate::medications::MedicationCatalog;
use crate::prediction::{DiseasePredictionModel, PredictionError, ReferenceData, ReferenceError};

/// Access log entries kept in memory; older entries are dropped.
const AUDIT_BUFFER_CAPACITY: usize = 1000;

/// Errors from building `CoreState`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Reference data error: {0}")]
    Reference(#[from] ReferenceError),
    #[error("Model training failed: {0}")]
    Model(#[from] PredictionError),
}

pub struct CoreState {
    pub config: ServerConfig,
    reference: Arc<ReferenceData>,
    catalog: MedicationCatalog,
    model: DiseasePredictionModel,
    started_at: DateTime<Utc>,
    audit: AuditLogger,
}

impl CoreState {
    /// Load reference data (from `config.reference_dir` when set), then
    /// train the disease model on its sample records.
    pub fn new(config: ServerConfig) -> Result<Self, CoreError> {
        let reference = match &config.reference_dir {
            Some(dir) => ReferenceData::load(dir)?,
            None => ReferenceData::builtin(),
        };
        Self::with_reference(config, reference)
    }

    /// Validate `reference`, then train the disease model on its samples.
    pub fn with_reference(config: ServerConfig, reference: ReferenceData) -> Result<Self, CoreError> {
        reference.validate()?;
        let reference = Arc::new(reference);
        let model = DiseasePredictionModel::trained(Arc::clone(&reference))?;
        let catalog = MedicationCatalog::builtin();

        tracing::info!(
            mappings = reference.mappings.len(),
            catalog = ?catalog.names().collect::<Vec<_>>(),
            "Core state ready"
        );

        Ok(Self {
            config,
            reference,
            catalog,
            model,
            started_at: Utc::now(),
            audit: AuditLogger::new(),
        })
    }

    /// State with default config and built-in reference data.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::new(ServerConfig::default())
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn catalog(&self) -> &MedicationCatalog {
        &self.catalog
    }

    pub fn model(&self) -> &DiseasePredictionModel {
        &self.model
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn log_access(&self, entry: AuditEntry) {
        self.audit.log(entry);
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }

    pub fn requests_served(&self) -> u64 {
        self.audit.total()
    }
}

// ═══════════════════════════════════════════════════════════
// Audit logger
// ═══════════════════════════════════════════════════════════

/// A single API access.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub request_id: uuid::Uuid,
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub latency_ms: u64,
}

/// Bounded in-memory access log.
pub struct AuditLogger {
    buffer: Mutex<VecDeque<AuditEntry>>,
    total: AtomicU64,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(AUDIT_BUFFER_CAPACITY)),
            total: AtomicU64::new(0),
        }
    }

    pub fn log(&self, entry: AuditEntry) {
        if let Ok(mut buf) = self.buffer.lock() {
            if buf.len() == AUDIT_BUFFER_CAPACITY {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.buffer
            .lock()
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Requests logged since startup, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}
