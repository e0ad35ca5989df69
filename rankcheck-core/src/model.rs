//! Reference model: what the platform should hold after each step of a run.
//!
//! The sequencer is the only writer. Assertion predicates read it through
//! the derived views (`expected_*`) and never mutate it.

use std::collections::{BTreeSet, HashMap};

use crate::config::BillingRates;
use crate::error::ModelError;
use crate::types::{ScoreRow, ScoreRows};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: String,
    pub display_name: String,
    pub disqualified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionRecord {
    pub id: String,
    pub title: String,
    pub finished: bool,
}

/// One row of the ranking the platform should serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedRank {
    /// 1-based.
    pub rank: i64,
    pub player_id: String,
    pub score: i64,
}

/// Billing the platform should report for the competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpectedBilling {
    pub scored_and_viewed: i64,
    pub scored_only: i64,
    pub viewed_only: i64,
    pub billing_yen: i64,
}

impl ExpectedBilling {
    pub fn from_categories(
        rates: &BillingRates,
        scored_and_viewed: i64,
        scored_only: i64,
        viewed_only: i64,
    ) -> Self {
        Self {
            scored_and_viewed,
            scored_only,
            viewed_only,
            billing_yen: rates.scored_and_viewed_yen * scored_and_viewed
                + rates.scored_only_yen * scored_only
                + rates.viewed_only_yen * viewed_only,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReferenceModel {
    tenant: Option<TenantRecord>,
    /// Creation order.
    roster: Vec<PlayerRecord>,
    competition: Option<CompetitionRecord>,
    /// Latest accepted submission, in submission order.
    scores: ScoreRows,
    submissions: usize,
    /// Players whose ranking reads succeeded while the competition was open.
    viewers: BTreeSet<String>,
}

impl ReferenceModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Writes (sequencer only) ──

    pub fn set_tenant(&mut self, tenant: TenantRecord) -> Result<(), ModelError> {
        if self.tenant.is_some() {
            return Err(ModelError::AlreadySet("tenant"));
        }
        self.tenant = Some(tenant);
        Ok(())
    }

    pub fn set_roster(&mut self, roster: Vec<PlayerRecord>) -> Result<(), ModelError> {
        if !self.roster.is_empty() {
            return Err(ModelError::AlreadySet("roster"));
        }
        self.roster = roster;
        Ok(())
    }

    pub fn set_competition(&mut self, competition: CompetitionRecord) -> Result<(), ModelError> {
        if self.competition.is_some() {
            return Err(ModelError::AlreadySet("competition"));
        }
        self.competition = Some(competition);
        Ok(())
    }

    /// Flip a player's disqualified flag. Happens at most once per player.
    pub fn disqualify(&mut self, player_id: &str) -> Result<(), ModelError> {
        let player = self
            .roster
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| ModelError::UnknownPlayer(player_id.to_string()))?;
        if player.disqualified {
            return Err(ModelError::AlreadyDisqualified(player_id.to_string()));
        }
        player.disqualified = true;
        Ok(())
    }

    /// Record an accepted submission. Replaces every earlier submission.
    pub fn submit_scores(&mut self, rows: ScoreRows) -> Result<(), ModelError> {
        let competition = self.competition()?;
        if competition.finished {
            return Err(ModelError::CompetitionFinished(competition.id.clone()));
        }
        for row in rows.iter() {
            if self.player(&row.player_id).is_none() {
                return Err(ModelError::UnknownPlayer(row.player_id.clone()));
            }
        }
        self.scores = rows;
        self.submissions += 1;
        Ok(())
    }

    /// Record a successful ranking read by `player_id`.
    ///
    /// Reads after the competition finished do not bill, so they are ignored.
    pub fn record_ranking_view(&mut self, player_id: &str) -> Result<(), ModelError> {
        if self.player(player_id).is_none() {
            return Err(ModelError::UnknownPlayer(player_id.to_string()));
        }
        if !self.competition()?.finished {
            self.viewers.insert(player_id.to_string());
        }
        Ok(())
    }

    pub fn finish_competition(&mut self) -> Result<(), ModelError> {
        let competition = self
            .competition
            .as_mut()
            .ok_or(ModelError::Missing("competition"))?;
        if competition.finished {
            return Err(ModelError::AlreadySet("competition.finished"));
        }
        competition.finished = true;
        Ok(())
    }

    // ── Reads ──

    pub fn tenant(&self) -> Result<&TenantRecord, ModelError> {
        self.tenant.as_ref().ok_or(ModelError::Missing("tenant"))
    }

    pub fn competition(&self) -> Result<&CompetitionRecord, ModelError> {
        self.competition
            .as_ref()
            .ok_or(ModelError::Missing("competition"))
    }

    pub fn roster(&self) -> &[PlayerRecord] {
        &self.roster
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerRecord> {
        self.roster.iter().find(|p| p.id == player_id)
    }

    pub fn player_at(&self, index: usize) -> Result<&PlayerRecord, ModelError> {
        self.roster.get(index).ok_or(ModelError::Missing("roster entry"))
    }

    pub fn scores(&self) -> &ScoreRows {
        &self.scores
    }

    pub fn submissions(&self) -> usize {
        self.submissions
    }

    // ── Derived views ──

    /// Latest row per player with its submission ordinal. A player repeated
    /// within one submission keeps its last row.
    fn effective_rows(&self) -> Vec<(usize, &ScoreRow)> {
        let mut last: HashMap<&str, usize> = HashMap::new();
        for (ordinal, row) in self.scores.iter().enumerate() {
            last.insert(row.player_id.as_str(), ordinal);
        }
        self.scores
            .iter()
            .enumerate()
            .filter(|(ordinal, row)| last.get(row.player_id.as_str()) == Some(ordinal))
            .collect()
    }

    /// The full ranking: score descending, ties by submission ordinal.
    ///
    /// Disqualified players stay in the ranking; disqualification only
    /// removes the right to view it.
    pub fn expected_ranking(&self) -> Vec<ExpectedRank> {
        let mut rows = self.effective_rows();
        rows.sort_by(|(oa, a), (ob, b)| b.score.cmp(&a.score).then(oa.cmp(ob)));
        rows.into_iter()
            .enumerate()
            .map(|(i, (_, row))| ExpectedRank {
                rank: i as i64 + 1,
                player_id: row.player_id.clone(),
                score: row.score,
            })
            .collect()
    }

    /// Rows ranked strictly after `rank_after`, at most `limit` of them.
    pub fn expected_page(&self, rank_after: usize, limit: usize) -> Vec<ExpectedRank> {
        self.expected_ranking()
            .into_iter()
            .skip(rank_after)
            .take(limit)
            .collect()
    }

    pub fn expected_score(&self, player_id: &str) -> Option<i64> {
        self.effective_rows()
            .into_iter()
            .find(|(_, row)| row.player_id == player_id)
            .map(|(_, row)| row.score)
    }

    /// Number of distinct players with a score.
    pub fn scored_player_count(&self) -> usize {
        self.effective_rows().len()
    }

    /// Billing for the competition by (scored × viewed) category.
    /// Disqualification does not affect billing.
    pub fn expected_billing(&self, rates: &BillingRates) -> ExpectedBilling {
        let scored: BTreeSet<&str> = self
            .effective_rows()
            .into_iter()
            .map(|(_, row)| row.player_id.as_str())
            .collect();
        let mut both = 0;
        let mut scored_only = 0;
        let mut viewed_only = 0;
        for player in &self.roster {
            let has_score = scored.contains(player.id.as_str());
            let viewed = self.viewers.contains(&player.id);
            match (has_score, viewed) {
                (true, true) => both += 1,
                (true, false) => scored_only += 1,
                (false, true) => viewed_only += 1,
                (false, false) => {}
            }
        }
        ExpectedBilling::from_categories(rates, both, scored_only, viewed_only)
    }
}
