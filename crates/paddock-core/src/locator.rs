//! Resolves a `(year, race-name hint)` pair to the live API's session key.
//!
//! Two stages, each deciding only when exactly one session qualifies:
//!
//! 1. **Direct**: the lowercase hint is a substring of the session's location
//!    or country.
//! 2. **Alias**: every race group the hint names is matched, on whole words,
//!    against location and country.
//!
//! Several candidates at the deciding stage is a collision (same country,
//! renamed event, ...). The locator returns `None` rather than guessing and the
//! caller proceeds batch-only.

use tracing::{debug, warn};

use crate::aliases::AliasTable;
use crate::domain::SessionType;
use crate::live::{LiveApiClient, LiveSession};

pub struct SessionLocator<'a> {
    live: &'a LiveApiClient,
    aliases: &'a AliasTable,
}

impl<'a> SessionLocator<'a> {
    pub fn new(live: &'a LiveApiClient, aliases: &'a AliasTable) -> Self {
        Self { live, aliases }
    }

    /// Session key of the year's Race matching `hint`; never an error.
    pub async fn resolve(&self, year: u16, hint: &str) -> Option<i64> {
        self.resolve_session(year, hint, SessionType::Race)
            .await
            .map(|session| session.session_key)
    }

    /// The `session_type` session of the weekend matching `hint`.
    pub async fn resolve_session(
        &self,
        year: u16,
        hint: &str,
        session_type: SessionType,
    ) -> Option<LiveSession> {
        let sessions = match self.live.sessions(year).await {
            Ok(sessions) => sessions,
            Err(error) => {
                warn!(year, hint, error = %error, "live session listing failed; proceeding batch-only");
                return None;
            }
        };

        let found = locate(&sessions, hint, session_type, self.aliases).cloned();
        match &found {
            Some(session) => debug!(
                year,
                hint,
                session_key = session.session_key,
                location = %session.location,
                "resolved live session"
            ),
            None => warn!(year, hint, session = %session_type, "no live session matched; proceeding batch-only"),
        }
        found
    }
}

/// Pure matching over an already fetched session listing.
pub fn locate<'s>(
    sessions: &'s [LiveSession],
    hint: &str,
    session_type: SessionType,
    aliases: &AliasTable,
) -> Option<&'s LiveSession> {
    let hint = hint.trim().to_lowercase();
    if hint.is_empty() {
        return None;
    }

    let candidates: Vec<&LiveSession> = sessions
        .iter()
        .filter(|session| session.is(session_type))
        .collect();

    let direct: Vec<&LiveSession> = candidates
        .iter()
        .copied()
        .filter(|session| {
            session.location.to_lowercase().contains(&hint)
                || session.country_name.to_lowercase().contains(&hint)
        })
        .collect();
    if !direct.is_empty() {
        return single(direct, &hint, "direct");
    }

    let groups: Vec<_> = aliases
        .race_groups()
        .iter()
        .filter(|group| group.matches_hint(&hint))
        .collect();
    if groups.is_empty() {
        return None;
    }

    let via_alias: Vec<&LiveSession> = candidates
        .iter()
        .copied()
        .filter(|session| {
            let location = session.location.to_lowercase();
            let country = session.country_name.to_lowercase();
            groups
                .iter()
                .any(|group| group.matches_text(&location) || group.matches_text(&country))
        })
        .collect();
    single(via_alias, &hint, "alias")
}

fn single<'s>(matches: Vec<&'s LiveSession>, hint: &str, stage: &str) -> Option<&'s LiveSession> {
    match matches.as_slice() {
        [] => None,
        [only] => Some(*only),
        many => {
            let candidates: Vec<String> = many
                .iter()
                .map(|session| format!("{} ({})", session.location, session.session_key))
                .collect();
            warn!(
                hint,
                stage,
                candidates = %candidates.join(", "),
                "ambiguous live session match; not guessing"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(key: i64, name: &str, location: &str, country: &str) -> LiveSession {
        LiveSession {
            session_key: key,
            session_name: name.to_owned(),
            session_type: if name == "Qualifying" { "Qualifying" } else { "Race" }.to_owned(),
            location: location.to_owned(),
            country_name: country.to_owned(),
            date_start: None,
            year: Some(2025),
            meeting_key: None,
        }
    }

    fn season() -> Vec<LiveSession> {
        vec![
            session(9693, "Race", "Suzuka", "Japan"),
            session(9692, "Qualifying", "Suzuka", "Japan"),
            session(9987, "Race", "Imola", "Italy"),
            session(9998, "Race", "Monza", "Italy"),
            session(9947, "Race", "Silverstone", "United Kingdom"),
            session(9860, "Race", "Spa-Francorchamps", "Belgium"),
            session(9850, "Race", "Barcelona", "Spain"),
        ]
    }

    #[test]
    fn direct_match_on_country() {
        let aliases = AliasTable::bundled().expect("aliases");
        let sessions = season();

        let found = locate(&sessions, "Japan", SessionType::Race, &aliases).expect("match");
        assert_eq!(found.session_key, 9693);

        let qualifying =
            locate(&sessions, "japan", SessionType::Qualifying, &aliases).expect("match");
        assert_eq!(qualifying.session_key, 9692);
    }

    #[test]
    fn alias_group_resolves_great_britain_to_silverstone() {
        let aliases = AliasTable::bundled().expect("aliases");
        let sessions = season();

        let found = locate(&sessions, "Great Britain", SessionType::Race, &aliases).expect("match");
        assert_eq!(found.location, "Silverstone");
    }

    #[test]
    fn renamed_events_stay_unresolved() {
        let aliases = AliasTable::bundled().expect("aliases");
        let sessions = season();

        assert!(locate(&sessions, "Emilia Romagna", SessionType::Race, &aliases).is_none());
    }

    #[test]
    fn several_candidates_are_not_guessed() {
        let aliases = AliasTable::bundled().expect("aliases");
        let sessions = season();

        assert!(locate(&sessions, "Italy", SessionType::Race, &aliases).is_none());
    }

    #[test]
    fn belgium_alias_does_not_catch_spain() {
        let aliases = AliasTable::bundled().expect("aliases");
        let sessions = season();

        let found = locate(&sessions, "Belgian", SessionType::Race, &aliases).expect("match");
        assert_eq!(found.session_key, 9860);
    }
}
