//! Merges batch and live driver identities into one [`DriverRecord`] map.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::domain::{BatchDriver, DriverRecord, LiveDriver, Provenance, ReconciliationReport};

/// Pure, deterministic merge of the two driver listings.
///
/// Batch wins on name, number and team; live contributes country and team
/// colour. A team disagreement is recorded on the record, never voted away.
/// Output iteration order is the abbreviation order of the `BTreeMap`, so equal
/// inputs serialize byte-identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn merge(
        &self,
        batch: &[BatchDriver],
        live: &[LiveDriver],
    ) -> (BTreeMap<String, DriverRecord>, ReconciliationReport) {
        let mut live_by_code: BTreeMap<&str, &LiveDriver> = BTreeMap::new();
        for driver in live {
            let code = driver.abbreviation.trim();
            if !code.is_empty() {
                live_by_code.entry(code).or_insert(driver);
            }
        }

        let mut records = BTreeMap::new();
        let (mut batch_only, mut live_only, mut both, mut discrepant) = (0, 0, 0, 0);

        for driver in batch {
            let code = driver.abbreviation.trim();
            if code.is_empty() || records.contains_key(code) {
                continue;
            }

            let record = match live_by_code.get(code) {
                Some(live) => {
                    both += 1;
                    let record = merged(code, driver, live);
                    if record.has_discrepancy {
                        discrepant += 1;
                        info!(
                            driver = code,
                            batch_team = %record.team_name_batch,
                            live_team = %record.team_name_live,
                            "team name discrepancy; keeping the batch value"
                        );
                    }
                    record
                }
                None => {
                    batch_only += 1;
                    batch_only_record(code, driver)
                }
            };
            records.insert(code.to_owned(), record);
        }

        for (code, driver) in live_by_code {
            if records.contains_key(code) {
                continue;
            }
            live_only += 1;
            records.insert(code.to_owned(), live_only_record(code, driver));
        }

        let report = ReconciliationReport::new(batch_only, live_only, both, discrepant);
        debug!(
            batch_only,
            live_only,
            both,
            discrepant,
            "reconciled driver identities"
        );
        (records, report)
    }
}

fn merged(code: &str, batch: &BatchDriver, live: &LiveDriver) -> DriverRecord {
    let team_batch = batch.team_name.trim();
    let team_live = live.team_name.trim();
    DriverRecord {
        abbreviation: code.to_owned(),
        full_name: prefer(&batch.full_name, &live.full_name),
        car_number: batch.car_number.or(live.driver_number),
        team_name_batch: team_batch.to_owned(),
        team_name_live: team_live.to_owned(),
        team_name_reconciled: prefer(team_batch, team_live),
        country_code: live.country_code.clone(),
        team_color: live.team_color.clone(),
        provenance: Provenance::Both,
        has_discrepancy: !team_batch.is_empty() && !team_live.is_empty() && team_batch != team_live,
    }
}

fn batch_only_record(code: &str, batch: &BatchDriver) -> DriverRecord {
    let team = batch.team_name.trim();
    DriverRecord {
        abbreviation: code.to_owned(),
        full_name: batch.full_name.clone(),
        car_number: batch.car_number,
        team_name_batch: team.to_owned(),
        team_name_live: String::new(),
        team_name_reconciled: team.to_owned(),
        country_code: String::new(),
        team_color: String::new(),
        provenance: Provenance::BatchOnly,
        has_discrepancy: false,
    }
}

fn live_only_record(code: &str, live: &LiveDriver) -> DriverRecord {
    let team = live.team_name.trim();
    DriverRecord {
        abbreviation: code.to_owned(),
        full_name: live.full_name.clone(),
        car_number: live.driver_number,
        team_name_batch: String::new(),
        team_name_live: team.to_owned(),
        team_name_reconciled: team.to_owned(),
        country_code: live.country_code.clone(),
        team_color: live.team_color.clone(),
        provenance: Provenance::LiveOnly,
        has_discrepancy: false,
    }
}

fn prefer(primary: &str, fallback: &str) -> String {
    if primary.trim().is_empty() {
        fallback.to_owned()
    } else {
        primary.to_owned()
    }
}
