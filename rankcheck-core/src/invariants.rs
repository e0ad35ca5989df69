//! Domain invariant predicates.
//!
//! Each function checks one decoded payload against values derived from the
//! reference model and reports the first discrepancy with want/got.

use std::collections::{BTreeSet, HashMap};

use crate::error::{ensure_eq, CheckError};
use crate::model::{ExpectedBilling, ExpectedRank};
use crate::types::{BillingReport, CompetitionRank, PlayerDetail};

/// Parse a `rank_after` cursor: empty means "from the top", otherwise a
/// non-negative integer ordinal.
pub fn parse_rank_cursor(cursor: &str) -> Option<usize> {
    if cursor.is_empty() {
        Some(0)
    } else {
        cursor.parse().ok()
    }
}

/// Created or listed players: same count as requested, every display name
/// one that was requested, no duplicates, nobody disqualified.
pub fn roster_matches_request(
    requested: &[String],
    players: &[PlayerDetail],
) -> Result<(), CheckError> {
    ensure_eq("number of players added", requested.len(), players.len())?;
    let wanted: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
    let mut seen = BTreeSet::new();
    for player in players {
        if player.is_disqualified {
            return Err(CheckError::violation(
                format!("newly added player {} is disqualified", player.id),
                false,
                true,
            ));
        }
        if !wanted.contains(player.display_name.as_str()) {
            return Err(CheckError::violation(
                "added player has an unrequested display name",
                format!("one of {} requested names", requested.len()),
                &player.display_name,
            ));
        }
        if !seen.insert(player.display_name.as_str()) {
            return Err(CheckError::violation(
                "display name returned twice",
                "unique display names",
                &player.display_name,
            ));
        }
    }
    Ok(())
}

/// The listed roster contains exactly the known ids, none disqualified.
pub fn roster_lists_ids(expected_ids: &[String], players: &[PlayerDetail]) -> Result<(), CheckError> {
    ensure_eq("number of players", expected_ids.len(), players.len())?;
    let listed: BTreeSet<&str> = players.iter().map(|p| p.id.as_str()).collect();
    if let Some(p) = players.iter().find(|p| p.is_disqualified) {
        return Err(CheckError::violation(
            format!("newly added player {} is disqualified", p.id),
            false,
            true,
        ));
    }
    for id in expected_ids {
        if !listed.contains(id.as_str()) {
            return Err(CheckError::violation(
                "added player missing from player list",
                id,
                "absent",
            ));
        }
    }
    Ok(())
}

/// Before finish the platform may still be aggregating, so an unpaginated
/// ranking may be short but never longer than `min(scored, limit)`.
pub fn ranking_within_bounds(
    ranks: &[CompetitionRank],
    scored: usize,
    limit: usize,
) -> Result<(), CheckError> {
    let bound = scored.min(limit);
    if ranks.len() > bound {
        return Err(CheckError::violation(
            format!("too many ranking rows (at most {limit} per page)"),
            format!("<= {bound}"),
            ranks.len(),
        ));
    }
    Ok(())
}

/// Every expected row present with exactly its rank and score, and nothing
/// else returned.
pub fn ranking_matches(
    ranks: &[CompetitionRank],
    expected: &[ExpectedRank],
) -> Result<(), CheckError> {
    ensure_eq("number of ranking rows", expected.len(), ranks.len())?;
    let by_player: HashMap<&str, &CompetitionRank> =
        ranks.iter().map(|r| (r.player_id.as_str(), r)).collect();
    for want in expected {
        let got = by_player.get(want.player_id.as_str()).ok_or_else(|| {
            CheckError::violation("player missing from ranking", &want.player_id, "absent")
        })?;
        ensure_eq(
            &format!("rank of player {}", want.player_id),
            want.rank,
            got.rank,
        )?;
        ensure_eq(
            &format!("score of player {}", want.player_id),
            want.score,
            got.score,
        )?;
    }
    Ok(())
}

/// Ranks must be strictly descending by score with ranks increasing by one.
pub fn ranking_is_ordered(ranks: &[CompetitionRank]) -> Result<(), CheckError> {
    for pair in ranks.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.score < b.score {
            return Err(CheckError::violation(
                format!("ranking not descending at rank {}", b.rank),
                format!("score <= {}", a.score),
                b.score,
            ));
        }
        ensure_eq("consecutive rank", a.rank + 1, b.rank)?;
    }
    Ok(())
}

/// A disqualified player is barred from viewing, not from being ranked.
pub fn ranking_includes(ranks: &[CompetitionRank], player_id: &str) -> Result<(), CheckError> {
    if ranks.iter().any(|r| r.player_id == player_id) {
        Ok(())
    } else {
        Err(CheckError::violation(
            "disqualified player removed from ranking",
            player_id,
            "absent",
        ))
    }
}

/// Exactly one report, for `competition_id`, billing the expected yen.
pub fn billing_matches(
    reports: &[BillingReport],
    competition_id: &str,
    expected: &ExpectedBilling,
) -> Result<(), CheckError> {
    ensure_eq("number of billing reports", 1, reports.len())?;
    let report = &reports[0];
    ensure_eq(
        "billed competition id",
        competition_id,
        report.competition_id.as_str(),
    )?;
    ensure_eq(
        &format!(
            "billing yen for competition {competition_id} ({} scored+viewed, {} scored only, {} viewed only)",
            expected.scored_and_viewed, expected.scored_only, expected.viewed_only
        ),
        expected.billing_yen,
        report.billing_yen,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BillingRates;
    use proptest::prelude::*;

    fn player(id: &str, name: &str) -> PlayerDetail {
        PlayerDetail {
            id: id.into(),
            display_name: name.into(),
            is_disqualified: false,
        }
    }

    fn rank(rank: i64, player_id: &str, score: i64) -> CompetitionRank {
        CompetitionRank {
            rank,
            score,
            player_id: player_id.into(),
            player_display_name: String::new(),
        }
    }

    #[test]
    fn test_rank_cursor() {
        assert_eq!(parse_rank_cursor(""), Some(0));
        assert_eq!(parse_rank_cursor("18"), Some(18));
        assert_eq!(parse_rank_cursor("-1"), None);
        assert_eq!(parse_rank_cursor("x"), None);
    }

    #[test]
    fn test_roster_is_order_independent() {
        let requested = vec!["a".to_string(), "b".to_string()];
        let players = vec![player("2", "b"), player("1", "a")];
        roster_matches_request(&requested, &players).unwrap();

        let dup = vec![player("2", "b"), player("1", "b")];
        assert!(roster_matches_request(&requested, &dup).is_err());

        let mut dq = players.clone();
        dq[0].is_disqualified = true;
        assert!(roster_matches_request(&requested, &dq).is_err());
        assert!(roster_lists_ids(&["1".into(), "2".into()], &dq).is_err());
        roster_lists_ids(&["1".into(), "2".into()], &players).unwrap();
        assert!(roster_lists_ids(&["1".into(), "3".into()], &players).is_err());
    }

    #[test]
    fn test_ranking_bounds() {
        let ranks = vec![rank(1, "a", 3), rank(2, "b", 2)];
        ranking_within_bounds(&ranks, 2, 100).unwrap();
        ranking_within_bounds(&ranks[..1], 2, 100).unwrap();
        assert!(ranking_within_bounds(&ranks, 1, 100).is_err());
        assert!(ranking_within_bounds(&ranks, 5, 1).is_err());
    }

    #[test]
    fn test_ranking_matches_reports_rank_mismatch() {
        let expected = vec![
            ExpectedRank {
                rank: 1,
                player_id: "b".into(),
                score: 101,
            },
            ExpectedRank {
                rank: 2,
                player_id: "a".into(),
                score: 100,
            },
        ];
        ranking_matches(&[rank(2, "a", 100), rank(1, "b", 101)], &expected).unwrap();
        let err = ranking_matches(&[rank(1, "a", 100), rank(2, "b", 101)], &expected).unwrap_err();
        assert_eq!(err.to_string(), "rank of player b (want: 1, got: 2)");
    }

    #[test]
    fn test_ranking_includes_disqualified() {
        let ranks = vec![rank(1, "a", 3)];
        ranking_includes(&ranks, "a").unwrap();
        assert!(ranking_includes(&ranks, "z").is_err());
    }

    #[test]
    fn test_billing_matches() {
        let rates = BillingRates::default();
        let expected = ExpectedBilling::from_categories(&rates, 1, 18, 1);
        let report = BillingReport {
            competition_id: "c1".into(),
            competition_title: String::new(),
            player_count: 0,
            visitor_count: 0,
            billing_player_yen: 0,
            billing_visitor_yen: 0,
            billing_yen: 1010,
        };
        billing_matches(std::slice::from_ref(&report), "c1", &expected).unwrap();
        assert!(billing_matches(&[], "c1", &expected).is_err());
        assert!(billing_matches(std::slice::from_ref(&report), "c2", &expected).is_err());
        let wrong = BillingReport {
            billing_yen: 1910,
            ..report
        };
        assert!(billing_matches(&[wrong], "c1", &expected).is_err());
    }

    proptest! {
        /// N players: one scored viewer, N-2 scored non-viewers, one viewer
        /// without a score bills 100 + 50(N-2) + 10.
        #[test]
        fn billing_closed_form(n in 4i64..500) {
            let b = ExpectedBilling::from_categories(&BillingRates::default(), 1, n - 2, 1);
            prop_assert_eq!(b.billing_yen, 100 + 50 * (n - 2) + 10);
        }

        /// Any strictly descending score list with consecutive ranks passes
        /// the order check.
        #[test]
        fn descending_scores_are_ordered(mut scores in prop::collection::vec(0i64..10_000, 1..50)) {
            scores.sort_unstable_by(|a, b| b.cmp(a));
            scores.dedup();
            let ranks: Vec<_> = scores
                .iter()
                .enumerate()
                .map(|(i, s)| rank(i as i64 + 1, &format!("p{i}"), *s))
                .collect();
            prop_assert!(ranking_is_ordered(&ranks).is_ok());
        }
    }
}
