use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use crate::aliases::AliasTable;
use crate::batch::{BatchSource, RawBatchSession, ResultsArchive, TimingArchive};
use crate::context::Context;
use crate::data_source::SourceError;
use crate::domain::{SessionKey, SessionType};

/// Batch provider backed by the results archive (classification and laps)
/// and the timing archive (weather, track status, race control).
///
/// Classification is mandatory; every other table is optional and simply
/// absent from the session when its feed cannot be read.
#[derive(Clone)]
pub struct HistoricalClient {
    archive: ResultsArchive,
    timing: TimingArchive,
    aliases: AliasTable,
}

impl HistoricalClient {
    pub fn new(archive: ResultsArchive, timing: TimingArchive, aliases: AliasTable) -> Self {
        Self {
            archive,
            timing,
            aliases,
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self::new(
            ResultsArchive::new(ctx.http.clone(), ctx.config.archive.clone()),
            TimingArchive::new(ctx.http.clone(), ctx.config.timing.clone()),
            ctx.aliases.clone(),
        )
    }

    async fn load_session(&self, key: &SessionKey) -> Result<RawBatchSession, SourceError> {
        let year = key.year();
        let hint = self.aliases.rewrite_event_name(key.event_name());
        if hint != key.event_name() {
            info!(from = key.event_name(), to = hint, "rewrote event hint for the results archive");
        }

        let event = self.archive.find_event(year, hint).await?;
        let classification = self
            .archive
            .classification(year, event.round, key.session_type())
            .await?;

        let laps = if key.session_type() == SessionType::Race {
            optional(
                "laps",
                self.archive
                    .laps(year, event.round, &classification.driver_codes)
                    .await,
            )
        } else {
            None
        };

        let metadata = event.metadata(year, key.session_type());
        let (weather, track_status, race_control_messages) = match self
            .timing
            .session_path(year, &event.race_name, &event.locality, key.session_type())
            .await
        {
            Ok(path) => (
                optional("weather", self.timing.weather(&path).await),
                optional("track_status", self.timing.track_status(&path).await),
                optional("race_control", self.timing.race_control(&path).await),
            ),
            Err(error) => {
                warn!(
                    session = %key,
                    error = %error,
                    "timing archive unavailable; weather, track status and race control left empty"
                );
                (None, None, None)
            }
        };

        Ok(RawBatchSession {
            metadata,
            results: classification.rows,
            laps,
            weather,
            car_data: BTreeMap::new(),
            track_status,
            race_control_messages,
        })
    }
}

impl BatchSource for HistoricalClient {
    fn load<'a>(
        &'a self,
        key: &'a SessionKey,
    ) -> Pin<Box<dyn Future<Output = Result<RawBatchSession, SourceError>> + Send + 'a>> {
        Box::pin(self.load_session(key))
    }
}

fn optional<T>(table: &'static str, result: Result<Vec<T>, SourceError>) -> Option<Vec<T>> {
    match result {
        Ok(rows) => Some(rows),
        Err(error) => {
            warn!(table, error = %error, code = error.code(), "optional batch table unavailable");
            None
        }
    }
}
