//! In-process reference platform.
//!
//! Serves every endpoint the oracle consumes from memory, with the same
//! role, tenant-isolation, status-code and billing rules as the real
//! service. Used to self-test the oracle: a clean platform must pass every
//! check, and each [`PlatformFault`] must be caught at a specific check.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tokio::time::Instant;

use crate::agent::{AccountProvider, Agent, Operation, RawResponse, Role};
use crate::config::BillingRates;
use crate::error::TransportError;
use crate::ids::SequenceAllocator;
use crate::invariants::parse_rank_cursor;
use crate::naming::is_valid_tenant_name;
use crate::sequencer::ADMIN_TENANT;
use crate::types::{
    BillingData, BillingReport, CompetitionAddData, CompetitionDetail, CompetitionRank,
    CompetitionsData, PlayerDetail, PlayerDisqualifiedData, PlayerProfileData,
    PlayerScoreDetail, PlayersData, RankingData, ScoreRow, ScoreUploadData, TenantDetail,
    TenantsAddData, TenantsBillingData, SCORE_CSV_HEADER,
};

/// Rows per ranking page.
pub const RANKING_PAGE_SIZE: usize = 100;
/// Tenants per admin dashboard page.
pub const DASHBOARD_PAGE_SIZE: usize = 10;

/// Deliberate defects the platform can be started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PlatformFault {
    /// Uploads add to earlier rows instead of replacing them.
    AppendScores,
    /// Disqualified players are dropped from rankings.
    HideDisqualifiedFromRanking,
    /// Disqualified players may still read player endpoints.
    LetDisqualifiedView,
    /// Every scorer or viewer is billed at the top rate.
    FlatBilling,
    /// A second tenant with an existing name is accepted.
    AcceptDuplicateTenants,
    /// `rank_after` is ignored; every page starts at rank 1.
    IgnoreRankAfter,
}

#[derive(Debug, Clone, Default)]
pub struct PlatformOptions {
    pub faults: BTreeSet<PlatformFault>,
    /// Delay between a finish and billing reflecting it.
    pub finish_lag: Duration,
    pub rates: BillingRates,
}

impl PlatformOptions {
    pub fn with_fault(mut self, fault: PlatformFault) -> Self {
        self.faults.insert(fault);
        self
    }

    pub fn with_finish_lag(mut self, lag: Duration) -> Self {
        self.finish_lag = lag;
        self
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Player {
    id: String,
    display_name: String,
    disqualified: bool,
}

impl Player {
    fn detail(&self) -> PlayerDetail {
        PlayerDetail {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            is_disqualified: self.disqualified,
        }
    }
}

#[derive(Debug)]
struct Competition {
    id: String,
    title: String,
    finished_at: Option<Instant>,
    /// Accepted rows in submission order.
    rows: Vec<ScoreRow>,
    visitors: BTreeSet<String>,
}

impl Competition {
    fn detail(&self) -> CompetitionDetail {
        CompetitionDetail {
            id: self.id.clone(),
            title: self.title.clone(),
            is_finished: self.finished_at.is_some(),
        }
    }

    fn latest_score(&self, player_id: &str) -> Option<i64> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.player_id == player_id)
            .map(|r| r.score)
    }
}

#[derive(Debug)]
struct Tenant {
    id: i64,
    name: String,
    display_name: String,
    players: Vec<Player>,
    competitions: Vec<Competition>,
}

impl Tenant {
    fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn competition_mut(&mut self, id: &str) -> Result<&mut Competition, Reject> {
        self.competitions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Reject::not_found("competition not found"))
    }
}

#[derive(Debug, Default)]
struct State {
    /// Creation order.
    tenants: Vec<Tenant>,
}

impl State {
    fn tenant(&self, name: &str) -> Result<&Tenant, Reject> {
        self.tenants
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Reject::unauthorized("tenant not found"))
    }

    fn tenant_mut(&mut self, name: &str) -> Result<&mut Tenant, Reject> {
        self.tenants
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| Reject::unauthorized("tenant not found"))
    }
}

/// A non-2xx reply.
#[derive(Debug)]
struct Reject {
    status: u16,
    message: String,
}

impl Reject {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    fn internal(message: impl std::fmt::Display) -> Self {
        Self::new(500, message.to_string())
    }
}

type Reply = Result<serde_json::Value, Reject>;

fn data<T: Serialize>(payload: T) -> Reply {
    serde_json::to_value(payload).map_err(Reject::internal)
}

// ---------------------------------------------------------------------------
// MemoryPlatform
// ---------------------------------------------------------------------------

struct Inner {
    state: Mutex<State>,
    ids: SequenceAllocator,
    options: PlatformOptions,
}

/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct MemoryPlatform {
    inner: Arc<Inner>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::with_options(PlatformOptions::default())
    }

    pub fn with_options(options: PlatformOptions) -> Self {
        if !options.faults.is_empty() {
            tracing::info!(faults = ?options.faults, "memory platform started with faults");
        }
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                ids: SequenceAllocator::new(),
                options,
            }),
        }
    }

    pub fn tenant_count(&self) -> usize {
        self.lock().map(|s| s.tenants.len()).unwrap_or(0)
    }

    fn has(&self, fault: PlatformFault) -> bool {
        self.inner.options.faults.contains(&fault)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Reject> {
        self.inner
            .state
            .lock()
            .map_err(|_| Reject::internal("platform state lock poisoned"))
    }

    /// Time-ordered id: seconds since the epoch, then a per-second counter.
    fn issue_id(&self) -> i64 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        self.inner.ids.next_keyed(secs)
    }

    fn handle(&self, role: Role, tenant: &str, identity: &str, op: &Operation) -> Reply {
        let required = op.required_role();
        if required != role {
            return Err(Reject::forbidden(format!(
                "{} requires role {required}",
                op.label()
            )));
        }
        match (role, op) {
            (Role::Admin, _) if tenant != ADMIN_TENANT => {
                Err(Reject::unauthorized("admin sessions must target the admin host"))
            }
            (_, Operation::AddTenant { name, display_name }) => self.add_tenant(name, display_name),
            (_, Operation::TenantsBilling { before }) => self.tenants_billing(before.as_deref()),
            (_, Operation::AddPlayers { display_names }) => self.add_players(tenant, display_names),
            (_, Operation::ListPlayers) => {
                let state = self.lock()?;
                let t = state.tenant(tenant)?;
                data(PlayersData {
                    players: t.players.iter().map(Player::detail).collect(),
                })
            }
            (_, Operation::DisqualifyPlayer { player_id }) => self.disqualify(tenant, player_id),
            (_, Operation::AddCompetition { title }) => self.add_competition(tenant, title),
            (_, Operation::UploadScores {
                competition_id,
                csv,
            }) => self.upload_scores(tenant, competition_id, csv),
            (_, Operation::FinishCompetition { competition_id }) => {
                let mut state = self.lock()?;
                let competition = state.tenant_mut(tenant)?.competition_mut(competition_id)?;
                competition.finished_at.get_or_insert_with(Instant::now);
                Ok(serde_json::Value::Null)
            }
            (_, Operation::OrganizerBilling) => {
                let state = self.lock()?;
                let t = state.tenant(tenant)?;
                data(BillingData {
                    reports: t
                        .competitions
                        .iter()
                        .rev()
                        .map(|c| self.billing_report(c))
                        .collect(),
                })
            }
            (_, Operation::PlayerProfile { player_id }) => self.profile(tenant, identity, player_id),
            (_, Operation::CompetitionRanking {
                competition_id,
                rank_after,
            }) => self.ranking(tenant, identity, competition_id, rank_after),
            (_, Operation::PlayerCompetitions) => {
                let state = self.lock()?;
                let t = state.tenant(tenant)?;
                self.authorize_player(t, identity)?;
                data(CompetitionsData {
                    competitions: t.competitions.iter().rev().map(Competition::detail).collect(),
                })
            }
        }
    }

    // ── Admin ──

    fn add_tenant(&self, name: &str, display_name: &str) -> Reply {
        if !is_valid_tenant_name(name) {
            return Err(Reject::bad_request(format!("invalid tenant name: {name}")));
        }
        let mut state = self.lock()?;
        if state.tenants.iter().any(|t| t.name == name)
            && !self.has(PlatformFault::AcceptDuplicateTenants)
        {
            return Err(Reject::bad_request(format!("duplicate tenant: {name}")));
        }
        let id = self.issue_id();
        state.tenants.push(Tenant {
            id,
            name: name.to_string(),
            display_name: display_name.to_string(),
            players: Vec::new(),
            competitions: Vec::new(),
        });
        tracing::debug!(tenant = name, id, "tenant created");
        data(TenantsAddData {
            tenant: TenantDetail {
                id: id.to_string(),
                name: name.to_string(),
                display_name: display_name.to_string(),
                billing: 0,
            },
        })
    }

    fn tenants_billing(&self, before: Option<&str>) -> Reply {
        let before = match before {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| Reject::bad_request(format!("invalid before cursor: {raw}")))?,
            ),
            None => None,
        };
        let state = self.lock()?;
        let tenants = state
            .tenants
            .iter()
            .rev()
            .filter(|t| before.map_or(true, |b| t.id < b))
            .take(DASHBOARD_PAGE_SIZE)
            .map(|t| TenantDetail {
                id: t.id.to_string(),
                name: t.name.clone(),
                display_name: t.display_name.clone(),
                billing: t
                    .competitions
                    .iter()
                    .map(|c| self.billing_report(c).billing_yen)
                    .sum(),
            })
            .collect();
        data(TenantsBillingData { tenants })
    }

    // ── Organizer ──

    fn add_players(&self, tenant: &str, display_names: &[String]) -> Reply {
        let mut state = self.lock()?;
        let t = state.tenant_mut(tenant)?;
        let mut added = Vec::with_capacity(display_names.len());
        for name in display_names {
            let player = Player {
                id: format!("{:x}", self.issue_id()),
                display_name: name.clone(),
                disqualified: false,
            };
            added.push(player.detail());
            t.players.push(player);
        }
        data(PlayersData { players: added })
    }

    fn disqualify(&self, tenant: &str, player_id: &str) -> Reply {
        let mut state = self.lock()?;
        let t = state.tenant_mut(tenant)?;
        let player = t
            .players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| Reject::not_found(format!("player not found: {player_id}")))?;
        player.disqualified = true;
        data(PlayerDisqualifiedData {
            player: player.detail(),
        })
    }

    fn add_competition(&self, tenant: &str, title: &str) -> Reply {
        let mut state = self.lock()?;
        let id = format!("{:x}", self.issue_id());
        let competition = Competition {
            id,
            title: title.to_string(),
            finished_at: None,
            rows: Vec::new(),
            visitors: BTreeSet::new(),
        };
        let detail = competition.detail();
        state.tenant_mut(tenant)?.competitions.push(competition);
        data(CompetitionAddData {
            competition: detail,
        })
    }

    fn upload_scores(&self, tenant: &str, competition_id: &str, csv: &str) -> Reply {
        let mut state = self.lock()?;
        let t = state.tenant_mut(tenant)?;
        if t.competition_mut(competition_id)?.finished_at.is_some() {
            return Err(Reject::bad_request("competition is finished"));
        }
        let rows = parse_score_csv(csv)?;
        if let Some(unknown) = rows.iter().find(|r| t.player(&r.player_id).is_none()) {
            return Err(Reject::bad_request(format!(
                "player not found: {}",
                unknown.player_id
            )));
        }
        let append = self.has(PlatformFault::AppendScores);
        let competition = t.competition_mut(competition_id)?;
        let accepted = rows.len() as i64;
        if append {
            competition.rows.extend(rows);
        } else {
            competition.rows = keep_last_per_player(rows);
        }
        data(ScoreUploadData { rows: accepted })
    }

    /// Billing is zero until the finish has been aggregated.
    fn billing_report(&self, c: &Competition) -> BillingReport {
        let rates = &self.inner.options.rates;
        let mut report = BillingReport {
            competition_id: c.id.clone(),
            competition_title: c.title.clone(),
            player_count: 0,
            visitor_count: 0,
            billing_player_yen: 0,
            billing_visitor_yen: 0,
            billing_yen: 0,
        };
        let settled = c
            .finished_at
            .is_some_and(|at| Instant::now() >= at + self.inner.options.finish_lag);
        if !settled {
            return report;
        }

        let scorers: BTreeSet<&str> = c.rows.iter().map(|r| r.player_id.as_str()).collect();
        let both = scorers.iter().filter(|p| c.visitors.contains(**p)).count() as i64;
        let scored_only = scorers.len() as i64 - both;
        let viewed_only = c
            .visitors
            .iter()
            .filter(|v| !scorers.contains(v.as_str()))
            .count() as i64;

        report.player_count = scorers.len() as i64;
        report.visitor_count = viewed_only;
        if self.has(PlatformFault::FlatBilling) {
            report.billing_player_yen = rates.scored_and_viewed_yen * scorers.len() as i64;
            report.billing_visitor_yen = rates.scored_and_viewed_yen * viewed_only;
        } else {
            report.billing_player_yen =
                rates.scored_and_viewed_yen * both + rates.scored_only_yen * scored_only;
            report.billing_visitor_yen = rates.viewed_only_yen * viewed_only;
        }
        report.billing_yen = report.billing_player_yen + report.billing_visitor_yen;
        report
    }

    // ── Player ──

    fn authorize_player<'t>(&self, t: &'t Tenant, identity: &str) -> Result<&'t Player, Reject> {
        let player = t
            .player(identity)
            .ok_or_else(|| Reject::unauthorized(format!("unknown player session: {identity}")))?;
        if player.disqualified && !self.has(PlatformFault::LetDisqualifiedView) {
            return Err(Reject::forbidden("player is disqualified"));
        }
        Ok(player)
    }

    fn profile(&self, tenant: &str, identity: &str, player_id: &str) -> Reply {
        let state = self.lock()?;
        let t = state.tenant(tenant)?;
        self.authorize_player(t, identity)?;
        let player = t
            .player(player_id)
            .ok_or_else(|| Reject::not_found(format!("player not found: {player_id}")))?;
        let scores = t
            .competitions
            .iter()
            .filter_map(|c| {
                c.latest_score(player_id).map(|score| PlayerScoreDetail {
                    competition_title: c.title.clone(),
                    score,
                })
            })
            .collect();
        data(PlayerProfileData {
            player: player.detail(),
            scores,
        })
    }

    fn ranking(&self, tenant: &str, identity: &str, competition_id: &str, rank_after: &str) -> Reply {
        let rank_after = parse_rank_cursor(rank_after)
            .ok_or_else(|| Reject::bad_request(format!("invalid rank_after: {rank_after}")))?;
        let hide_disqualified = self.has(PlatformFault::HideDisqualifiedFromRanking);
        let skip = if self.has(PlatformFault::IgnoreRankAfter) {
            0
        } else {
            rank_after
        };

        let mut state = self.lock()?;
        let t = state.tenant_mut(tenant)?;
        let viewer = self.authorize_player(t, identity)?.id.clone();
        let disqualified: BTreeSet<String> = t
            .players
            .iter()
            .filter(|p| p.disqualified)
            .map(|p| p.id.clone())
            .collect();
        let names: HashMap<String, String> = t
            .players
            .iter()
            .map(|p| (p.id.clone(), p.display_name.clone()))
            .collect();

        let competition = t.competition_mut(competition_id)?;
        if competition.finished_at.is_none() {
            competition.visitors.insert(viewer);
        }

        let mut ordered: Vec<(usize, &ScoreRow)> = competition
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| !(hide_disqualified && disqualified.contains(&r.player_id)))
            .collect();
        ordered.sort_by(|(oa, a), (ob, b)| b.score.cmp(&a.score).then(oa.cmp(ob)));
        let ranks = ordered
            .into_iter()
            .enumerate()
            .skip(skip)
            .take(RANKING_PAGE_SIZE)
            .map(|(i, (_, row))| CompetitionRank {
                rank: i as i64 + 1,
                score: row.score,
                player_id: row.player_id.clone(),
                player_display_name: names.get(&row.player_id).cloned().unwrap_or_default(),
            })
            .collect();
        data(RankingData {
            competition: Some(competition.detail()),
            ranks,
        })
    }
}

/// Parse an uploaded result file: header line, then `player_id,score` rows.
fn parse_score_csv(csv: &str) -> Result<Vec<ScoreRow>, Reject> {
    let mut lines = csv.lines().filter(|l| !l.trim().is_empty());
    match lines.next() {
        Some(header) if header.trim() == SCORE_CSV_HEADER => {}
        _ => return Err(Reject::bad_request("invalid CSV header")),
    }
    lines
        .map(|line| {
            let (player_id, score) = line
                .split_once(',')
                .ok_or_else(|| Reject::bad_request(format!("invalid CSV row: {line}")))?;
            let score = score
                .trim()
                .parse::<i64>()
                .map_err(|_| Reject::bad_request(format!("invalid score: {score}")))?;
            Ok(ScoreRow {
                player_id: player_id.trim().to_string(),
                score,
            })
        })
        .collect()
}

/// A player repeated within one file keeps only its last row, at that
/// row's position.
fn keep_last_per_player(rows: Vec<ScoreRow>) -> Vec<ScoreRow> {
    let mut last: HashMap<&str, usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        last.insert(row.player_id.as_str(), i);
    }
    let keep: BTreeSet<usize> = last.into_values().collect();
    rows.into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, r)| r)
        .collect()
}

fn envelope(reply: Reply) -> RawResponse {
    match reply {
        Ok(serde_json::Value::Null) => RawResponse::new(200, json!({ "status": true }).to_string()),
        Ok(payload) => RawResponse::new(
            200,
            json!({ "status": true, "data": payload }).to_string(),
        ),
        Err(reject) => RawResponse::new(
            reject.status,
            json!({ "status": false, "message": reject.message }).to_string(),
        ),
    }
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

#[async_trait]
impl AccountProvider for MemoryPlatform {
    async fn agent(
        &self,
        role: Role,
        tenant: &str,
        identity: &str,
    ) -> anyhow::Result<Arc<dyn Agent>> {
        if identity.is_empty() {
            anyhow::bail!("empty identity for {role} account on tenant {tenant}");
        }
        Ok(Arc::new(MemoryAgent {
            platform: self.clone(),
            role,
            tenant: tenant.to_string(),
            identity: identity.to_string(),
        }))
    }
}

/// A session on the in-process platform.
pub struct MemoryAgent {
    platform: MemoryPlatform,
    role: Role,
    tenant: String,
    identity: String,
}

#[async_trait]
impl Agent for MemoryAgent {
    fn role(&self) -> Role {
        self.role
    }

    async fn send(&self, op: &Operation) -> Result<RawResponse, TransportError> {
        let reply = self
            .platform
            .handle(self.role, &self.tenant, &self.identity, op);
        if let Err(reject) = &reply {
            tracing::debug!(
                op = op.label(),
                status = reject.status,
                message = %reject.message,
                "memory platform rejected request"
            );
        }
        Ok(envelope(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::decode_payload;

    async fn send(agent: &Arc<dyn Agent>, op: Operation) -> RawResponse {
        agent.send(&op).await.unwrap()
    }

    async fn organizer_with_players(
        platform: &MemoryPlatform,
        names: &[&str],
    ) -> (Arc<dyn Agent>, Vec<PlayerDetail>) {
        let admin = platform.agent(Role::Admin, ADMIN_TENANT, "admin").await.unwrap();
        let resp = send(
            &admin,
            Operation::AddTenant {
                name: "t-one".into(),
                display_name: "T One".into(),
            },
        )
        .await;
        assert_eq!(resp.status, 200);
        let org = platform.agent(Role::Organizer, "t-one", "organizer").await.unwrap();
        let resp = send(
            &org,
            Operation::AddPlayers {
                display_names: names.iter().map(|n| n.to_string()).collect(),
            },
        )
        .await;
        let players = decode_payload::<PlayersData>(&resp.body).unwrap().players;
        (org, players)
    }

    #[test]
    fn test_csv_parsing() {
        let rows = parse_score_csv("player_id,score\na,1\nb, 2\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].score, 2);
        assert_eq!(parse_score_csv("id,score\na,1\n").unwrap_err().status, 400);
        assert_eq!(parse_score_csv("player_id,score\na,x\n").unwrap_err().status, 400);
        assert_eq!(parse_score_csv("player_id,score\nab\n").unwrap_err().status, 400);
    }

    #[test]
    fn test_keep_last_per_player() {
        let rows = parse_score_csv("player_id,score\na,1\nb,2\na,3\n").unwrap();
        let kept = keep_last_per_player(rows);
        assert_eq!(
            kept.iter().map(|r| (r.player_id.as_str(), r.score)).collect::<Vec<_>>(),
            vec![("b", 2), ("a", 3)]
        );
    }

    #[tokio::test]
    async fn test_role_and_tenant_rules() {
        let platform = MemoryPlatform::new();
        let (org, players) = organizer_with_players(&platform, &["p0", "p1"]).await;

        // Organizer cannot call admin endpoints.
        let resp = send(&org, Operation::TenantsBilling { before: None }).await;
        assert_eq!(resp.status, 403);

        // Unknown tenant.
        let stray = platform.agent(Role::Organizer, "t-two", "organizer").await.unwrap();
        assert_eq!(send(&stray, Operation::ListPlayers).await.status, 401);

        // Player from another tenant is unknown here.
        let outsider = platform.agent(Role::Player, "t-one", "nobody").await.unwrap();
        assert_eq!(send(&outsider, Operation::PlayerCompetitions).await.status, 401);

        let player = platform
            .agent(Role::Player, "t-one", &players[0].id)
            .await
            .unwrap();
        assert_eq!(send(&player, Operation::PlayerCompetitions).await.status, 200);
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_tenants_rejected() {
        let platform = MemoryPlatform::new();
        let admin = platform.agent(Role::Admin, ADMIN_TENANT, "admin").await.unwrap();
        let add = |name: &str| Operation::AddTenant {
            name: name.into(),
            display_name: "x".into(),
        };
        assert_eq!(send(&admin, add("dup-name")).await.status, 200);
        assert_eq!(send(&admin, add("dup-name")).await.status, 400);
        assert_eq!(send(&admin, add("INVALID_TENANTID")).await.status, 400);
        assert_eq!(platform.tenant_count(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_pages_newest_first() {
        let platform = MemoryPlatform::new();
        let admin = platform.agent(Role::Admin, ADMIN_TENANT, "admin").await.unwrap();
        for i in 0..12 {
            let resp = send(
                &admin,
                Operation::AddTenant {
                    name: format!("tenant-{i}"),
                    display_name: format!("Tenant {i}"),
                },
            )
            .await;
            assert_eq!(resp.status, 200);
        }
        let resp = send(&admin, Operation::TenantsBilling { before: None }).await;
        let page = decode_payload::<TenantsBillingData>(&resp.body).unwrap().tenants;
        assert_eq!(page.len(), DASHBOARD_PAGE_SIZE);
        assert_eq!(page[0].name, "tenant-11");

        let last_id = page[DASHBOARD_PAGE_SIZE - 1].id.clone();
        let resp = send(
            &admin,
            Operation::TenantsBilling {
                before: Some(last_id),
            },
        )
        .await;
        let rest = decode_payload::<TenantsBillingData>(&resp.body).unwrap().tenants;
        assert_eq!(
            rest.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            vec!["tenant-1", "tenant-0"]
        );

        let resp = send(
            &admin,
            Operation::TenantsBilling {
                before: Some("soon".into()),
            },
        )
        .await;
        assert_eq!(resp.status, 400);
    }

    #[tokio::test]
    async fn test_ranking_pagination_and_visits() {
        let platform = MemoryPlatform::new();
        let (org, players) = organizer_with_players(&platform, &["a", "b", "c"]).await;
        let resp = send(&org, Operation::AddCompetition { title: "cup".into() }).await;
        let competition = decode_payload::<CompetitionAddData>(&resp.body)
            .unwrap()
            .competition;
        let csv = format!(
            "player_id,score\n{},10\n{},30\n",
            players[0].id, players[1].id
        );
        let resp = send(
            &org,
            Operation::UploadScores {
                competition_id: competition.id.clone(),
                csv,
            },
        )
        .await;
        assert_eq!(decode_payload::<ScoreUploadData>(&resp.body).unwrap().rows, 2);

        let viewer = platform
            .agent(Role::Player, "t-one", &players[2].id)
            .await
            .unwrap();
        let ranking = |after: &str| Operation::CompetitionRanking {
            competition_id: competition.id.clone(),
            rank_after: after.into(),
        };
        let resp = send(&viewer, ranking("")).await;
        let ranks = decode_payload::<RankingData>(&resp.body).unwrap().ranks;
        assert_eq!(ranks[0].player_id, players[1].id);
        assert_eq!(ranks[1].rank, 2);

        let resp = send(&viewer, ranking("1")).await;
        let ranks = decode_payload::<RankingData>(&resp.body).unwrap().ranks;
        assert_eq!(ranks.len(), 1);
        assert_eq!(ranks[0].player_id, players[0].id);
        assert_eq!(send(&viewer, ranking("x")).await.status, 400);

        // Billing stays zero until finished.
        let resp = send(&org, Operation::OrganizerBilling).await;
        let reports = decode_payload::<BillingData>(&resp.body).unwrap().reports;
        assert_eq!(reports[0].billing_yen, 0);

        let resp = send(
            &org,
            Operation::FinishCompetition {
                competition_id: competition.id.clone(),
            },
        )
        .await;
        assert_eq!(resp.status, 200);
        let resp = send(&org, Operation::OrganizerBilling).await;
        let reports = decode_payload::<BillingData>(&resp.body).unwrap().reports;
        // Two scored without viewing, one viewer without a score.
        assert_eq!(reports[0].billing_yen, 50 + 50 + 10);
        assert_eq!(reports[0].visitor_count, 1);
    }

    #[tokio::test]
    async fn test_disqualified_player_is_forbidden() {
        let platform = MemoryPlatform::new();
        let (org, players) = organizer_with_players(&platform, &["a", "b"]).await;
        let resp = send(
            &org,
            Operation::DisqualifyPlayer {
                player_id: players[1].id.clone(),
            },
        )
        .await;
        assert!(
            decode_payload::<PlayerDisqualifiedData>(&resp.body)
                .unwrap()
                .player
                .is_disqualified
        );
        let dq = platform
            .agent(Role::Player, "t-one", &players[1].id)
            .await
            .unwrap();
        assert_eq!(send(&dq, Operation::PlayerCompetitions).await.status, 403);

        let resp = send(
            &org,
            Operation::DisqualifyPlayer {
                player_id: "missing".into(),
            },
        )
        .await;
        assert_eq!(resp.status, 404);
    }
}
