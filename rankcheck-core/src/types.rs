use serde::{Deserialize, Serialize};

// ─── Envelope ─────────────────────────────────────────────────

/// The JSON envelope every platform endpoint answers with.
///
/// `data` is absent on error responses and on some empty successes
/// (competition finish), so it is kept as raw JSON until the caller picks
/// the payload type.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope {
    pub status: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload type for endpoints whose `data` carries nothing the oracle reads.
pub type EmptyData = serde::de::IgnoredAny;

// ─── Entities ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TenantDetail {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub billing: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerDetail {
    pub id: String,
    pub display_name: String,
    pub is_disqualified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompetitionDetail {
    pub id: String,
    pub title: String,
    pub is_finished: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerScoreDetail {
    pub competition_title: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompetitionRank {
    pub rank: i64,
    pub score: i64,
    pub player_id: String,
    #[serde(default)]
    pub player_display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BillingReport {
    pub competition_id: String,
    #[serde(default)]
    pub competition_title: String,
    /// Players who submitted a score and viewed the ranking.
    #[serde(default)]
    pub player_count: i64,
    /// Players who only viewed the ranking.
    #[serde(default)]
    pub visitor_count: i64,
    #[serde(default)]
    pub billing_player_yen: i64,
    #[serde(default)]
    pub billing_visitor_yen: i64,
    pub billing_yen: i64,
}

// ─── Endpoint payloads (`data` field) ─────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantsAddData {
    pub tenant: TenantDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantsBillingData {
    pub tenants: Vec<TenantDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayersData {
    pub players: Vec<PlayerDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerDisqualifiedData {
    pub player: PlayerDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompetitionAddData {
    pub competition: CompetitionDetail,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScoreUploadData {
    pub rows: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingData {
    pub reports: Vec<BillingReport>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerProfileData {
    pub player: PlayerDetail,
    pub scores: Vec<PlayerScoreDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankingData {
    #[serde(default)]
    pub competition: Option<CompetitionDetail>,
    pub ranks: Vec<CompetitionRank>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompetitionsData {
    pub competitions: Vec<CompetitionDetail>,
}

// ─── Score submission ─────────────────────────────────────────

pub const SCORE_CSV_HEADER: &str = "player_id,score";

/// One `(player, score)` row of a result submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub player_id: String,
    pub score: i64,
}

/// An ordered result submission. Row order is the submission ordinal used
/// for tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreRows(pub Vec<ScoreRow>);

impl ScoreRows {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoreRow> {
        self.0.iter()
    }

    /// Render as the CSV body the upload endpoint accepts.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(SCORE_CSV_HEADER.len() + 1 + self.0.len() * 24);
        out.push_str(SCORE_CSV_HEADER);
        out.push('\n');
        for row in &self.0 {
            out.push_str(&row.player_id);
            out.push(',');
            out.push_str(&row.score.to_string());
            out.push('\n');
        }
        out
    }
}

impl FromIterator<ScoreRow> for ScoreRows {
    fn from_iter<I: IntoIterator<Item = ScoreRow>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
