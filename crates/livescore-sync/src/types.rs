//! Wire and domain types for The Odds API and the canonical event model
//!
//! # Design Principles
//! 1. Upstream shapes (`Raw*`) mirror the API field names exactly
//! 2. Missing optional upstream fields default instead of failing the whole payload
//! 3. `CanonicalEvent` is the only shape handed to presentation adapters
//!
//! # Sources
//! - Sports: https://the-odds-api.com/liveapi/guides/v4/#get-sports
//! - Odds: https://the-odds-api.com/liveapi/guides/v4/#get-odds
//! - Scores: https://the-odds-api.com/liveapi/guides/v4/#get-scores

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Catalogue
// ============================================================================

/// Sport catalogue entry
/// Source: GET /v4/sports
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sport {
    /// Sport key used in odds/scores paths (e.g. "basketball_nba")
    pub key: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Whether the upstream currently has events for this sport
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub has_outrights: bool,
}

/// Price format requested from the odds endpoint
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OddsFormat {
    #[default]
    Decimal,
    American,
}

impl OddsFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OddsFormat::Decimal => "decimal",
            OddsFormat::American => "american",
        }
    }
}

impl std::fmt::Display for OddsFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OddsFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "decimal" => Ok(OddsFormat::Decimal),
            "american" => Ok(OddsFormat::American),
            other => Err(format!("unknown odds format '{}', expected decimal or american", other)),
        }
    }
}

// ============================================================================
// Odds (upstream)
// Source: GET /v4/sports/{sport}/odds
// ============================================================================

/// Single priced outcome within a market
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Outcome {
    /// Team name (h2h) or "Over"/"Under" (totals)
    pub name: String,
    pub price: f64,
    /// Handicap or total line, absent for h2h
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<f64>,
}

/// Market quoted by a bookmaker ("h2h", "spreads", "totals")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

/// One fixture as reported by the odds endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawOddsRecord {
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: String,
    /// Kick-off time (ISO 8601)
    pub commence_time: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

// ============================================================================
// Scores (upstream)
// Source: GET /v4/sports/{sport}/scores
// ============================================================================

/// Per-team score entry of the list form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NamedScore {
    pub name: String,
    /// Upstream sends a string; numbers are tolerated
    #[serde(default)]
    pub score: Option<Value>,
}

impl NamedScore {
    fn points(&self) -> u32 {
        match &self.score {
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            Some(Value::Number(n)) => n.as_u64().map(|v| v as u32).unwrap_or(0),
            _ => 0,
        }
    }
}

/// Score payload; the upstream uses the list form, older fixtures the pair form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawScores {
    /// `[{"name": "Boston Celtics", "score": "102"}, ...]`
    Named(Vec<NamedScore>),
    /// `{"home": 102, "away": 99}`
    Pair {
        #[serde(default)]
        home: Option<u32>,
        #[serde(default)]
        away: Option<u32>,
    },
}

impl RawScores {
    /// Resolve (home, away) points; missing entries count as 0
    pub fn home_away(&self, home_team: &str, away_team: &str) -> (u32, u32) {
        match self {
            RawScores::Pair { home, away } => (home.unwrap_or(0), away.unwrap_or(0)),
            RawScores::Named(entries) => {
                let lookup = |team: &str| {
                    entries.iter().find(|e| e.name == team).map(NamedScore::points).unwrap_or(0)
                };
                (lookup(home_team), lookup(away_team))
            }
        }
    }
}

/// One fixture as reported by the scores endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawScoreRecord {
    pub id: String,
    #[serde(default)]
    pub sport_key: String,
    #[serde(default)]
    pub sport_title: String,
    #[serde(default)]
    pub commence_time: String,
    #[serde(default)]
    pub completed: bool,
    pub home_team: String,
    pub away_team: String,
    /// Null until the fixture starts
    #[serde(default)]
    pub scores: Option<RawScores>,
    #[serde(default)]
    pub last_update: Option<String>,
    /// "scheduled" | "in_progress" | "ended"; anything else reads as scheduled
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
}

// ============================================================================
// Canonical model (presentation-facing)
// ============================================================================

/// Team descriptor synthesized from a raw team name
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub abbreviation: String,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Live => "live",
            EventStatus::Finished => "finished",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    pub home: u32,
    pub away: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// Head-to-head prices; only ever built with both sides present
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventOdds {
    pub home_win: f64,
    pub away_win: f64,
}

/// Merged, UI-ready fixture
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    /// Odds-source identifier
    pub id: String,
    pub home_team: Team,
    pub away_team: Team,
    pub status: EventStatus,
    pub score: Score,
    /// Kick-off time (ISO 8601)
    pub start_time: String,
    pub league: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odds: Option<EventOdds>,
}

impl CanonicalEvent {
    /// Parse `start_time` as Unix timestamp (seconds)
    pub fn start_timestamp(&self) -> Option<i64> {
        chrono::DateTime::parse_from_rfc3339(&self.start_time).ok().map(|dt| dt.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_odds_record() {
        let json = r#"{
            "id": "e912304de2b2ce35b473ce2ecd3d1502",
            "sport_key": "basketball_nba",
            "sport_title": "NBA",
            "commence_time": "2024-01-10T00:10:00Z",
            "home_team": "Boston Celtics",
            "away_team": "Los Angeles Lakers",
            "bookmakers": [{
                "key": "draftkings",
                "title": "DraftKings",
                "last_update": "2024-01-09T22:00:00Z",
                "markets": [{
                    "key": "h2h",
                    "last_update": "2024-01-09T22:00:00Z",
                    "outcomes": [
                        {"name": "Boston Celtics", "price": 1.4},
                        {"name": "Los Angeles Lakers", "price": 3.1}
                    ]
                }]
            }]
        }"#;

        let record: RawOddsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.home_team, "Boston Celtics");
        assert_eq!(record.bookmakers[0].markets[0].outcomes.len(), 2);
        assert_eq!(record.bookmakers[0].markets[0].outcomes[1].price, 3.1);
    }

    #[test]
    fn test_parse_score_record_list_form() {
        let json = r#"{
            "id": "abc",
            "sport_key": "basketball_nba",
            "sport_title": "NBA",
            "commence_time": "2024-01-10T00:10:00Z",
            "completed": false,
            "home_team": "Boston Celtics",
            "away_team": "Los Angeles Lakers",
            "scores": [
                {"name": "Los Angeles Lakers", "score": "88"},
                {"name": "Boston Celtics", "score": "97"}
            ],
            "last_update": "2024-01-10T02:00:00Z",
            "status": "in_progress"
        }"#;

        let record: RawScoreRecord = serde_json::from_str(json).unwrap();
        let scores = record.scores.unwrap();
        assert_eq!(scores.home_away("Boston Celtics", "Los Angeles Lakers"), (97, 88));
    }

    #[test]
    fn test_parse_score_record_pair_form_and_nulls() {
        let json = r#"{
            "id": "abc",
            "home_team": "A",
            "away_team": "B",
            "scores": {"home": 3},
            "period": "2nd Half"
        }"#;
        let record: RawScoreRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.scores.unwrap().home_away("A", "B"), (3, 0));
        assert_eq!(record.period.as_deref(), Some("2nd Half"));

        let json = r#"{"id": "x", "home_team": "A", "away_team": "B", "scores": null}"#;
        let record: RawScoreRecord = serde_json::from_str(json).unwrap();
        assert!(record.scores.is_none());
        assert!(record.status.is_none());
    }

    #[test]
    fn test_odds_format_parsing() {
        assert_eq!("decimal".parse::<OddsFormat>(), Ok(OddsFormat::Decimal));
        assert_eq!("AMERICAN".parse::<OddsFormat>(), Ok(OddsFormat::American));
        assert!("fractional".parse::<OddsFormat>().is_err());
        assert_eq!(serde_json::to_string(&OddsFormat::American).unwrap(), "\"american\"");
    }

    #[test]
    fn test_canonical_event_serializes_camel_case() {
        let event = CanonicalEvent {
            id: "1".into(),
            home_team: Team { id: "a".into(), name: "A".into(), abbreviation: "A".into() },
            away_team: Team { id: "b".into(), name: "B".into(), abbreviation: "B".into() },
            status: EventStatus::Live,
            score: Score::default(),
            start_time: "2024-01-10T00:10:00Z".into(),
            league: "NBA".into(),
            odds: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"homeTeam\""));
        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"status\":\"live\""));
        assert!(!json.contains("odds"));
        assert_eq!(event.start_timestamp(), Some(1704845400));
    }
}
