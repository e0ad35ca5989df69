//! Agent seam, the sole boundary between the oracle and the platform.
//!
//! The oracle never speaks HTTP itself. It describes each call as an
//! [`Operation`] and hands it to an [`Agent`] obtained from an
//! [`AccountProvider`] for a given role and tenant.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;

// ── Roles ──────────────────────────────────────────────────────

/// The three account kinds the platform authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Platform-wide SaaS administrator.
    Admin,
    /// Manages players and competitions within one tenant.
    Organizer,
    /// Tenant- and identity-scoped competitor.
    Player,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Player => "player",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Operations ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// How an operation's input travels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// `application/x-www-form-urlencoded`; keys may repeat.
    Form(Vec<(&'static str, String)>),
    /// A single multipart file field.
    File {
        field: &'static str,
        file_name: &'static str,
        content: String,
    },
}

/// Every platform endpoint the oracle consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    AddTenant { name: String, display_name: String },
    TenantsBilling { before: Option<String> },
    AddPlayers { display_names: Vec<String> },
    ListPlayers,
    DisqualifyPlayer { player_id: String },
    AddCompetition { title: String },
    /// Replaces the competition's full result set.
    UploadScores { competition_id: String, csv: String },
    FinishCompetition { competition_id: String },
    OrganizerBilling,
    PlayerProfile { player_id: String },
    CompetitionRanking { competition_id: String, rank_after: String },
    PlayerCompetitions,
}

impl Operation {
    /// Short stable label for logs and transport errors.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::AddTenant { .. } => "admin.tenants.add",
            Operation::TenantsBilling { .. } => "admin.tenants.billing",
            Operation::AddPlayers { .. } => "organizer.players.add",
            Operation::ListPlayers => "organizer.players",
            Operation::DisqualifyPlayer { .. } => "organizer.player.disqualified",
            Operation::AddCompetition { .. } => "organizer.competitions.add",
            Operation::UploadScores { .. } => "organizer.competition.score",
            Operation::FinishCompetition { .. } => "organizer.competition.finish",
            Operation::OrganizerBilling => "organizer.billing",
            Operation::PlayerProfile { .. } => "player.player",
            Operation::CompetitionRanking { .. } => "player.competition.ranking",
            Operation::PlayerCompetitions => "player.competitions",
        }
    }

    /// The role the platform requires for this operation.
    pub fn required_role(&self) -> Role {
        match self {
            Operation::AddTenant { .. } | Operation::TenantsBilling { .. } => Role::Admin,
            Operation::AddPlayers { .. }
            | Operation::ListPlayers
            | Operation::DisqualifyPlayer { .. }
            | Operation::AddCompetition { .. }
            | Operation::UploadScores { .. }
            | Operation::FinishCompetition { .. }
            | Operation::OrganizerBilling => Role::Organizer,
            Operation::PlayerProfile { .. }
            | Operation::CompetitionRanking { .. }
            | Operation::PlayerCompetitions => Role::Player,
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Operation::AddTenant { .. }
            | Operation::AddPlayers { .. }
            | Operation::DisqualifyPlayer { .. }
            | Operation::AddCompetition { .. }
            | Operation::UploadScores { .. }
            | Operation::FinishCompetition { .. } => Method::Post,
            Operation::TenantsBilling { .. }
            | Operation::ListPlayers
            | Operation::OrganizerBilling
            | Operation::PlayerProfile { .. }
            | Operation::CompetitionRanking { .. }
            | Operation::PlayerCompetitions => Method::Get,
        }
    }

    /// Path segments below the host, unescaped. Transports escape them.
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            Operation::AddTenant { .. } => vec!["api", "admin", "tenants", "add"],
            Operation::TenantsBilling { .. } => vec!["api", "admin", "tenants", "billing"],
            Operation::AddPlayers { .. } => vec!["api", "organizer", "players", "add"],
            Operation::ListPlayers => vec!["api", "organizer", "players"],
            Operation::DisqualifyPlayer { player_id } => {
                vec!["api", "organizer", "player", player_id.as_str(), "disqualified"]
            }
            Operation::AddCompetition { .. } => vec!["api", "organizer", "competitions", "add"],
            Operation::UploadScores { competition_id, .. } => {
                vec!["api", "organizer", "competition", competition_id.as_str(), "score"]
            }
            Operation::FinishCompetition { competition_id } => {
                vec!["api", "organizer", "competition", competition_id.as_str(), "finish"]
            }
            Operation::OrganizerBilling => vec!["api", "organizer", "billing"],
            Operation::PlayerProfile { player_id } => {
                vec!["api", "player", "player", player_id.as_str()]
            }
            Operation::CompetitionRanking { competition_id, .. } => {
                vec!["api", "player", "competition", competition_id.as_str(), "ranking"]
            }
            Operation::PlayerCompetitions => vec!["api", "player", "competitions"],
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Operation::TenantsBilling {
                before: Some(before),
            } => vec![("before", before.clone())],
            Operation::CompetitionRanking { rank_after, .. } if !rank_after.is_empty() => {
                vec![("rank_after", rank_after.clone())]
            }
            _ => Vec::new(),
        }
    }

    pub fn body(&self) -> RequestBody {
        match self {
            Operation::AddTenant { name, display_name } => RequestBody::Form(vec![
                ("name", name.clone()),
                ("display_name", display_name.clone()),
            ]),
            Operation::AddPlayers { display_names } => RequestBody::Form(
                display_names
                    .iter()
                    .map(|n| ("display_name[]", n.clone()))
                    .collect(),
            ),
            Operation::AddCompetition { title } => {
                RequestBody::Form(vec![("title", title.clone())])
            }
            Operation::UploadScores { csv, .. } => RequestBody::File {
                field: "scores",
                file_name: "scores.csv",
                content: csv.clone(),
            },
            _ => RequestBody::Empty,
        }
    }
}

// ── Responses ──────────────────────────────────────────────────

/// An undecoded platform response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

// ── Traits ─────────────────────────────────────────────────────

/// An authenticated request-issuing handle scoped to one role and tenant.
///
/// Implementations must be Send + Sync; one handle is reused for every check
/// of a run that acts in that role.
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> Role;

    async fn send(&self, op: &Operation) -> Result<RawResponse, TransportError>;
}

/// Issues agents for `(role, tenant, identity)`.
///
/// Admin agents use the reserved tenant name `"admin"`.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn agent(
        &self,
        role: Role,
        tenant: &str,
        identity: &str,
    ) -> anyhow::Result<Arc<dyn Agent>>;
}
