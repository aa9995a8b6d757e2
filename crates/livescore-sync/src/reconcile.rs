//! Odds + scores reconciliation
//!
//! # Algorithm
//! 1. The odds record is authoritative for id, teams, start time and league
//! 2. Scores are matched by exact (home_team, away_team) pair, first match wins
//!    (the two endpoints do not share ids)
//! 3. No match -> `scheduled`, 0-0
//! 4. Odds come from the first bookmaker's first market, both sides or nothing
//!
//! Output preserves input order; sorting is a separate presentation step.

use crate::types::{
    CanonicalEvent, EventOdds, EventStatus, RawOddsRecord, RawScoreRecord, Score, Team,
};

/// Merge odds records with any matching score records
pub fn merge(odds: &[RawOddsRecord], scores: &[RawScoreRecord]) -> Vec<CanonicalEvent> {
    odds.iter().map(|record| merge_one(record, scores)).collect()
}

fn merge_one(record: &RawOddsRecord, scores: &[RawScoreRecord]) -> CanonicalEvent {
    let matched = scores
        .iter()
        .find(|s| s.home_team == record.home_team && s.away_team == record.away_team);

    let (status, score) = match matched {
        Some(s) => {
            let (home, away) = s
                .scores
                .as_ref()
                .map(|sc| sc.home_away(&s.home_team, &s.away_team))
                .unwrap_or((0, 0));
            (map_status(s.status.as_deref()), Score { home, away, period: s.period.clone() })
        }
        None => (EventStatus::Scheduled, Score::default()),
    };

    let league = if record.sport_title.is_empty() {
        record.sport_key.clone()
    } else {
        record.sport_title.clone()
    };

    CanonicalEvent {
        id: record.id.clone(),
        home_team: team_from_name(&record.home_team),
        away_team: team_from_name(&record.away_team),
        status,
        score,
        start_time: record.commence_time.clone(),
        league,
        odds: extract_odds(record),
    }
}

/// Upstream status -> canonical status
pub fn map_status(status: Option<&str>) -> EventStatus {
    match status {
        Some("in_progress") => EventStatus::Live,
        Some("ended") => EventStatus::Finished,
        _ => EventStatus::Scheduled,
    }
}

/// Synthesize a team descriptor; the upstream has no stable team ids
pub fn team_from_name(name: &str) -> Team {
    let id = name.split_whitespace().collect::<Vec<_>>().join("-").to_lowercase();
    // Best effort only, not a real team code
    let abbreviation = name.split_whitespace().last().unwrap_or_default().to_uppercase();
    Team { id, name: name.to_string(), abbreviation }
}

fn extract_odds(record: &RawOddsRecord) -> Option<EventOdds> {
    // TODO: pick the h2h market explicitly once presentation needs spreads/totals too
    let outcomes = &record.bookmakers.first()?.markets.first()?.outcomes;
    let price_for = |team: &str| outcomes.iter().find(|o| o.name == team).map(|o| o.price);

    let home_win = price_for(&record.home_team)?;
    let away_win = price_for(&record.away_team)?;
    Some(EventOdds { home_win, away_win })
}
