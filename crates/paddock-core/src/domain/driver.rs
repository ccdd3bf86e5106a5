use serde::{Deserialize, Serialize};

/// Driver identity as reported by the batch provider's classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDriver {
    pub abbreviation: String,
    pub full_name: String,
    pub car_number: Option<u32>,
    pub team_name: String,
}

/// Driver identity as reported by the live API's `drivers` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveDriver {
    pub driver_number: Option<u32>,
    pub abbreviation: String,
    pub full_name: String,
    pub team_name: String,
    pub team_color: String,
    pub country_code: String,
}

/// Which source(s) contributed to a [`DriverRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    BatchOnly,
    LiveOnly,
    Both,
}

/// Reconciled per-entrant identity, keyed by abbreviation within a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub abbreviation: String,
    pub full_name: String,
    pub car_number: Option<u32>,
    pub team_name_batch: String,
    pub team_name_live: String,
    pub team_name_reconciled: String,
    pub country_code: String,
    pub team_color: String,
    pub provenance: Provenance,
    pub has_discrepancy: bool,
}

/// Counts produced by one reconciliation pass.
///
/// Fields are private so a report can only come out of a merge or a cache read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    batch_only: usize,
    live_only: usize,
    both: usize,
    discrepant: usize,
}

impl ReconciliationReport {
    pub(crate) const fn new(batch_only: usize, live_only: usize, both: usize, discrepant: usize) -> Self {
        Self {
            batch_only,
            live_only,
            both,
            discrepant,
        }
    }

    pub const fn batch_only(&self) -> usize {
        self.batch_only
    }

    pub const fn live_only(&self) -> usize {
        self.live_only
    }

    pub const fn both(&self) -> usize {
        self.both
    }

    pub const fn discrepant(&self) -> usize {
        self.discrepant
    }

    pub const fn total(&self) -> usize {
        self.batch_only + self.live_only + self.both
    }
}
