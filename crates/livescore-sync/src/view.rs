//! Stateless filter/sort over the canonical event list

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::{CanonicalEvent, EventStatus};

/// Status selector; `All` disables status filtering
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Live,
    Finished,
    Scheduled,
}

impl StatusFilter {
    fn accepts(&self, status: EventStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Live => status == EventStatus::Live,
            StatusFilter::Finished => status == EventStatus::Finished,
            StatusFilter::Scheduled => status == EventStatus::Scheduled,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "live" => Ok(StatusFilter::Live),
            "finished" => Ok(StatusFilter::Finished),
            "scheduled" => Ok(StatusFilter::Scheduled),
            other => Err(format!("unknown status '{}', expected all|live|finished|scheduled", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Time,
    League,
    Team,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "time" => Ok(SortKey::Time),
            "league" => Ok(SortKey::League),
            "team" => Ok(SortKey::Team),
            other => Err(format!("unknown sort key '{}', expected time|league|team", other)),
        }
    }
}

/// Keep events matching `status` AND, for a non-empty `query`, whose home
/// team, away team or league contains it case-insensitively
pub fn filter_events(
    events: &[CanonicalEvent],
    status: StatusFilter,
    query: &str,
) -> Vec<CanonicalEvent> {
    let query = query.to_lowercase();
    events
        .iter()
        .filter(|e| status.accepts(e.status))
        .filter(|e| {
            query.is_empty()
                || e.home_team.name.to_lowercase().contains(&query)
                || e.away_team.name.to_lowercase().contains(&query)
                || e.league.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Stable sort by the given key; ties keep input order
pub fn sort_events(events: &[CanonicalEvent], key: SortKey) -> Vec<CanonicalEvent> {
    let mut sorted = events.to_vec();
    match key {
        SortKey::Time => sorted.sort_by(compare_start),
        SortKey::League => sorted.sort_by(|a, b| a.league.cmp(&b.league)),
        SortKey::Team => sorted.sort_by(|a, b| a.home_team.name.cmp(&b.home_team.name)),
    }
    sorted
}

// Unparseable start times go last
fn compare_start(a: &CanonicalEvent, b: &CanonicalEvent) -> Ordering {
    match (a.start_timestamp(), b.start_timestamp()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::team_from_name;
    use crate::types::Score;

    fn event(id: &str, home: &str, away: &str, status: EventStatus, start: &str, league: &str) -> CanonicalEvent {
        CanonicalEvent {
            id: id.to_string(),
            home_team: team_from_name(home),
            away_team: team_from_name(away),
            status,
            score: Score::default(),
            start_time: start.to_string(),
            league: league.to_string(),
            odds: None,
        }
    }

    fn fixture() -> Vec<CanonicalEvent> {
        vec![
            event("1", "Los Angeles Lakers", "Boston Celtics", EventStatus::Live, "2024-01-10T03:00:00Z", "NBA"),
            event("2", "Miami Heat", "Los Angeles Lakers", EventStatus::Scheduled, "2024-01-11T01:00:00Z", "NBA"),
            event("3", "Golden State Warriors", "Denver Nuggets", EventStatus::Live, "2024-01-10T02:00:00Z", "NBA"),
        ]
    }

    fn ids(events: &[CanonicalEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_all_with_empty_query_keeps_everything_in_order() {
        let events = fixture();
        assert_eq!(filter_events(&events, StatusFilter::All, ""), events);
    }

    #[test]
    fn test_status_and_query_both_apply() {
        let filtered = filter_events(&fixture(), StatusFilter::Live, "lakers");
        assert_eq!(ids(&filtered), vec!["1"]);
    }

    #[test]
    fn test_query_is_case_insensitive_and_matches_league() {
        let events = fixture();
        assert_eq!(ids(&filter_events(&events, StatusFilter::All, "LAKERS")), vec!["1", "2"]);
        assert_eq!(filter_events(&events, StatusFilter::All, "nba").len(), 3);
        assert!(filter_events(&events, StatusFilter::Finished, "").is_empty());
    }

    #[test]
    fn test_sort_by_time_is_idempotent() {
        let once = sort_events(&fixture(), SortKey::Time);
        assert_eq!(ids(&once), vec!["3", "1", "2"]);
        let twice = sort_events(&once, SortKey::Time);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_by_time_handles_offsets_and_bad_timestamps() {
        let events = vec![
            event("bad", "A", "B", EventStatus::Scheduled, "not a date", "NBA"),
            event("late", "A", "B", EventStatus::Scheduled, "2024-01-10T05:00:00+02:00", "NBA"),
            event("early", "A", "B", EventStatus::Scheduled, "2024-01-10T04:00:00Z", "NBA"),
        ];
        // 05:00+02:00 == 03:00Z, earlier than 04:00Z
        assert_eq!(ids(&sort_events(&events, SortKey::Time)), vec!["late", "early", "bad"]);
    }

    #[test]
    fn test_sort_by_league_and_team_is_stable() {
        let events = vec![
            event("1", "Miami Heat", "X", EventStatus::Live, "", "NFL"),
            event("2", "Arsenal", "Y", EventStatus::Live, "", "EPL"),
            event("3", "Boston Celtics", "Z", EventStatus::Live, "", "NFL"),
        ];
        assert_eq!(ids(&sort_events(&events, SortKey::League)), vec!["2", "1", "3"]);
        assert_eq!(ids(&sort_events(&events, SortKey::Team)), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_parse_selectors() {
        assert_eq!("Live".parse::<StatusFilter>(), Ok(StatusFilter::Live));
        assert_eq!("team".parse::<SortKey>(), Ok(SortKey::Team));
        assert!("soon".parse::<StatusFilter>().is_err());
        assert!("score".parse::<SortKey>().is_err());
    }
}
