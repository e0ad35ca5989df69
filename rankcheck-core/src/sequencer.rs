//! Workflow sequencer: one validation run over the platform lifecycle.
//!
//! ```text
//! tenant ─▶ players ─▶ competition ─▶ disqualify ─▶ scores ─▶ profile
//!        ─▶ rankings (viewer, disqualified, no-score) ─▶ finish ─▶ settle
//!        ─▶ final ranking ─▶ organizer billing ─▶ competitions ─▶ dashboard
//! ```
//!
//! Each step issues its operations through an [`Agent`], validates the
//! response against the [`ReferenceModel`], reports to the [`StepSink`] and
//! only then updates the model. The first failing check ends the run.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::Instrument;

use crate::agent::{AccountProvider, Agent, Operation, Role};
use crate::assertion::Expectation;
use crate::config::OracleConfig;
use crate::context::RunContext;
use crate::error::{ensure_eq, CheckError, ModelError, OracleError};
use crate::invariants;
use crate::model::{CompetitionRecord, PlayerRecord, ReferenceModel, TenantRecord};
use crate::naming::{is_valid_tenant_name, run_tenant_name};
use crate::settle::SettleWindow;
use crate::sink::{CheckOutcome, CheckRecord, StepSink};
use crate::types::{
    BillingData, CompetitionAddData, CompetitionsData, EmptyData, PlayerDetail,
    PlayerDisqualifiedData, PlayerProfileData, PlayersData, RankingData, ScoreRow, ScoreRows,
    ScoreUploadData, TenantsAddData, TenantsBillingData,
};

/// Tenant name the platform reserves for admin sessions.
pub const ADMIN_TENANT: &str = "admin";

const UNKNOWN_PLAYER_ID: &str = "non-exist-player";
const UNKNOWN_COMPETITION_ID: &str = "nonexisting-competition";

/// Result of a run in which every check passed.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run: u64,
    pub tenant_name: String,
    pub competition_id: String,
    pub checks_passed: usize,
}

// ---------------------------------------------------------------------------
// Checker: status/decode/predicate plumbing shared by every step
// ---------------------------------------------------------------------------

struct Checker {
    run: u64,
    sink: Arc<dyn StepSink>,
    ctx: RunContext,
    passed: AtomicUsize,
}

impl Checker {
    fn report(&self, check: &str, outcome: CheckOutcome) {
        self.sink.record(CheckRecord {
            run: self.run,
            check: check.to_string(),
            outcome,
        });
    }

    fn pass(&self, check: &str) {
        self.passed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(check, "check passed");
        self.report(check, CheckOutcome::Passed);
    }

    fn fail(&self, check: &str, kind: CheckError) -> OracleError {
        if kind.is_cancelled() {
            self.report(check, CheckOutcome::Incomplete(kind.to_string()));
        } else {
            self.report(check, CheckOutcome::Failed(kind.to_string()));
        }
        OracleError::new(check, kind)
    }

    fn model<T>(&self, check: &str, result: Result<T, ModelError>) -> Result<T, OracleError> {
        result.map_err(|e| self.fail(check, e.into()))
    }

    async fn evaluate<T: DeserializeOwned>(
        &self,
        check: &str,
        agent: &dyn Agent,
        op: &Operation,
        expectation: Expectation<'_, T>,
    ) -> Result<Option<T>, OracleError> {
        tracing::debug!(
            check,
            op = op.label(),
            role = %agent.role(),
            want = expectation.expected_status(),
            "issuing check"
        );
        let Some(response) = self.ctx.run_until_cancelled(agent.send(op)).await else {
            return Err(self.fail(check, CheckError::Cancelled));
        };
        match expectation.evaluate(response) {
            Ok(payload) => {
                self.pass(check);
                Ok(payload)
            }
            Err(kind) => Err(self.fail(check, kind)),
        }
    }

    /// Status-only check, used for every negative path.
    async fn expect_status(
        &self,
        check: &str,
        agent: &dyn Agent,
        op: Operation,
        code: u16,
    ) -> Result<(), OracleError> {
        self.evaluate(check, agent, &op, Expectation::<EmptyData>::status(code))
            .await
            .map(|_| ())
    }

    /// 200 with a payload of type `T` satisfying `predicate`.
    async fn expect_success<'a, T, F>(
        &self,
        check: &str,
        agent: &dyn Agent,
        op: Operation,
        predicate: F,
    ) -> Result<T, OracleError>
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> Result<(), CheckError> + Send + 'a,
    {
        self.evaluate(check, agent, &op, Expectation::success(200, predicate))
            .await?
            .ok_or_else(|| {
                OracleError::new(check, CheckError::Decode("no payload decoded".into()))
            })
    }
}

// ---------------------------------------------------------------------------
// ValidationRun
// ---------------------------------------------------------------------------

/// One oracle run. Owns its reference model; shares nothing mutable with
/// other runs.
pub struct ValidationRun {
    config: Arc<OracleConfig>,
    accounts: Arc<dyn AccountProvider>,
    checker: Checker,
    model: ReferenceModel,
    settle: SettleWindow,
}

impl ValidationRun {
    pub fn new(
        run: u64,
        config: Arc<OracleConfig>,
        accounts: Arc<dyn AccountProvider>,
        sink: Arc<dyn StepSink>,
        ctx: RunContext,
    ) -> Self {
        let settle = SettleWindow::new(config.settle_window());
        Self {
            config,
            accounts,
            checker: Checker {
                run,
                sink,
                ctx,
                passed: AtomicUsize::new(0),
            },
            model: ReferenceModel::new(),
            settle,
        }
    }

    pub fn run_id(&self) -> u64 {
        self.checker.run
    }

    /// Execute every step in order. Stops at the first failing check.
    pub async fn execute(mut self) -> Result<RunSummary, OracleError> {
        let span = tracing::info_span!("validation_run", run = self.checker.run);
        async move {
            tracing::info!("validation run started");
            match self.steps().await {
                Ok(()) => {
                    let summary = RunSummary {
                        run: self.checker.run,
                        tenant_name: self.tenant_name()?,
                        competition_id: self.competition_id()?,
                        checks_passed: self.checker.passed.load(Ordering::Relaxed),
                    };
                    tracing::info!(
                        tenant = %summary.tenant_name,
                        checks = summary.checks_passed,
                        "validation run passed"
                    );
                    Ok(summary)
                }
                Err(e) => {
                    tracing::warn!(check = %e.check, error = %e.kind, "validation run failed");
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn steps(&mut self) -> Result<(), OracleError> {
        let admin = self
            .acquire("admin account", Role::Admin, ADMIN_TENANT, "admin")
            .await?;
        self.create_tenant(admin.as_ref()).await?;

        let tenant = self.tenant_name()?;
        let organizer = self
            .acquire("organizer account", Role::Organizer, &tenant, "organizer")
            .await?;
        self.add_players(organizer.as_ref()).await?;
        self.list_players(organizer.as_ref()).await?;
        self.add_competition(organizer.as_ref()).await?;
        self.disqualify_player(organizer.as_ref()).await?;
        self.upload_scores(organizer.as_ref()).await?;

        let viewer_id = self.roster_id(0)?;
        let player = self
            .acquire("player account", Role::Player, &tenant, &viewer_id)
            .await?;
        self.fetch_profile(player.as_ref()).await?;
        self.preliminary_rankings(player.as_ref(), &tenant).await?;

        self.finish_competition(organizer.as_ref()).await?;
        self.wait_for_settle().await?;
        self.final_ranking(player.as_ref()).await?;
        self.organizer_billing(organizer.as_ref()).await?;
        self.player_competitions(player.as_ref()).await?;
        self.tenants_dashboard(admin.as_ref()).await?;
        Ok(())
    }

    async fn acquire(
        &self,
        check: &str,
        role: Role,
        tenant: &str,
        identity: &str,
    ) -> Result<Arc<dyn Agent>, OracleError> {
        match self
            .checker
            .ctx
            .run_until_cancelled(self.accounts.agent(role, tenant, identity))
            .await
        {
            Some(Ok(agent)) => Ok(agent),
            Some(Err(e)) => Err(self
                .checker
                .fail(check, CheckError::Provision(format!("{e:#}")))),
            None => Err(self.checker.fail(check, CheckError::Cancelled)),
        }
    }

    fn tenant_name(&self) -> Result<String, OracleError> {
        self.checker
            .model("tenant", self.model.tenant().map(|t| t.name.clone()))
    }

    fn competition_id(&self) -> Result<String, OracleError> {
        self.checker
            .model("competition", self.model.competition().map(|c| c.id.clone()))
    }

    fn roster_id(&self, index: usize) -> Result<String, OracleError> {
        self.checker
            .model("roster", self.model.player_at(index).map(|p| p.id.clone()))
    }

    // ── 1. Tenant ──

    async fn create_tenant(&mut self, admin: &dyn Agent) -> Result<(), OracleError> {
        let check = "tenant add";
        let name = run_tenant_name(&self.config.tenant_name_prefix, self.checker.run);
        let display_name = format!(
            "{}-{}",
            self.config.tenant_display_name_prefix, self.checker.run
        );
        if !is_valid_tenant_name(&name) {
            return Err(self.checker.fail(
                check,
                CheckError::violation("derived tenant name is not host-safe", "valid name", &name),
            ));
        }

        let (want_name, want_display) = (name.clone(), display_name.clone());
        self.checker
            .expect_success(
                check,
                admin,
                Operation::AddTenant {
                    name: name.clone(),
                    display_name: display_name.clone(),
                },
                move |r: &TenantsAddData| {
                    ensure_eq(
                        "created tenant display_name",
                        want_display.as_str(),
                        r.tenant.display_name.as_str(),
                    )?;
                    ensure_eq("created tenant name", want_name.as_str(), r.tenant.name.as_str())
                },
            )
            .await?;
        self.checker.model(
            check,
            self.model.set_tenant(TenantRecord {
                name: name.clone(),
                display_name: display_name.clone(),
            }),
        )?;

        self.checker
            .expect_status(
                "tenant add: duplicate name",
                admin,
                Operation::AddTenant {
                    name,
                    display_name: display_name.clone(),
                },
                400,
            )
            .await?;
        self.checker
            .expect_status(
                "tenant add: invalid name",
                admin,
                Operation::AddTenant {
                    name: self.config.invalid_tenant_name.clone(),
                    display_name,
                },
                400,
            )
            .await
    }

    // ── 2-3. Players ──

    async fn add_players(&mut self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let check = "players add";
        let requested = self.config.player_display_names();
        let data: PlayersData = self
            .checker
            .expect_success(
                check,
                organizer,
                Operation::AddPlayers {
                    display_names: requested.clone(),
                },
                |r: &PlayersData| invariants::roster_matches_request(&requested, &r.players),
            )
            .await?;
        let roster = order_roster(&requested, &data.players).map_err(|e| self.checker.fail(check, e))?;
        self.checker.model(check, self.model.set_roster(roster))
    }

    async fn list_players(&self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let ids: Vec<String> = self.model.roster().iter().map(|p| p.id.clone()).collect();
        self.checker
            .expect_success(
                "players list",
                organizer,
                Operation::ListPlayers,
                |r: &PlayersData| invariants::roster_lists_ids(&ids, &r.players),
            )
            .await
            .map(|_| ())
    }

    // ── 4. Competition ──

    async fn add_competition(&mut self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let check = "competition add";
        let title = self.config.competition_title.clone();
        let data: CompetitionAddData = self
            .checker
            .expect_success(
                check,
                organizer,
                Operation::AddCompetition {
                    title: title.clone(),
                },
                |r: &CompetitionAddData| {
                    ensure_eq(
                        "created competition title",
                        title.as_str(),
                        r.competition.title.as_str(),
                    )?;
                    if r.competition.is_finished {
                        return Err(CheckError::violation(
                            format!("new competition {} is already finished", r.competition.id),
                            false,
                            true,
                        ));
                    }
                    Ok(())
                },
            )
            .await?;
        self.checker.model(
            check,
            self.model.set_competition(CompetitionRecord {
                id: data.competition.id,
                title,
                finished: false,
            }),
        )
    }

    // ── 5. Disqualification ──

    async fn disqualify_player(&mut self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let check = "player disqualify";
        let target = self.roster_id(self.config.disqualified_index())?;
        self.checker
            .expect_success(
                check,
                organizer,
                Operation::DisqualifyPlayer {
                    player_id: target.clone(),
                },
                |r: &PlayerDisqualifiedData| {
                    if !r.player.is_disqualified {
                        return Err(CheckError::violation(
                            format!("player {} was not disqualified", r.player.id),
                            true,
                            false,
                        ));
                    }
                    ensure_eq(
                        "disqualified player id",
                        target.as_str(),
                        r.player.id.as_str(),
                    )
                },
            )
            .await?;
        self.checker.model(check, self.model.disqualify(&target))?;

        self.checker
            .expect_status(
                "player disqualify: unknown player",
                organizer,
                Operation::DisqualifyPlayer {
                    player_id: UNKNOWN_PLAYER_ID.to_string(),
                },
                404,
            )
            .await
    }

    // ── 6. Results ──

    fn scored_players(&self) -> Vec<&PlayerRecord> {
        self.model
            .roster()
            .iter()
            .take(self.config.no_score_index())
            .collect()
    }

    async fn submit(
        &mut self,
        check: &str,
        organizer: &dyn Agent,
        rows: ScoreRows,
    ) -> Result<(), OracleError> {
        let competition_id = self.competition_id()?;
        let sent = rows.len() as i64;
        self.checker
            .expect_success(
                check,
                organizer,
                Operation::UploadScores {
                    competition_id,
                    csv: rows.to_csv(),
                },
                move |r: &ScoreUploadData| ensure_eq("accepted score rows", sent, r.rows),
            )
            .await?;
        self.checker.model(check, self.model.submit_scores(rows))
    }

    async fn upload_scores(&mut self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let scored = self.scored_players();
        let m = scored.len() as i64;
        let base = self.config.score_base;
        let final_rows: ScoreRows = scored
            .iter()
            .enumerate()
            .map(|(i, p)| ScoreRow {
                player_id: p.id.clone(),
                score: base + i as i64,
            })
            .collect();
        // Reverse order and disjoint values, so any leftover shows up.
        let superseded: ScoreRows = scored
            .iter()
            .enumerate()
            .map(|(i, p)| ScoreRow {
                player_id: p.id.clone(),
                score: base + 1_000 + (m - 1 - i as i64),
            })
            .collect();

        if self.config.verify_resubmission {
            self.submit("score upload: superseded", organizer, superseded)
                .await?;
        }
        let csv = final_rows.to_csv();
        self.submit("score upload", organizer, final_rows).await?;

        self.checker
            .expect_status(
                "score upload: unknown competition",
                organizer,
                Operation::UploadScores {
                    competition_id: UNKNOWN_COMPETITION_ID.to_string(),
                    csv,
                },
                404,
            )
            .await?;

        let invalid: ScoreRows = std::iter::once(ScoreRow {
            player_id: "not-exist-player".to_string(),
            score: 1,
        })
        .collect();
        self.checker
            .expect_status(
                "score upload: unknown player",
                organizer,
                Operation::UploadScores {
                    competition_id: self.competition_id()?,
                    csv: invalid.to_csv(),
                },
                400,
            )
            .await
    }

    // ── 7. Player profile ──

    async fn fetch_profile(&self, player: &dyn Agent) -> Result<(), OracleError> {
        let check = "player profile";
        let target = self.roster_id(self.config.profile_player_index)?;
        let title = self.checker.model(check, self.model.competition())?.title.clone();
        let score = self
            .model
            .expected_score(&target)
            .ok_or_else(|| {
                self.checker
                    .fail(check, ModelError::UnknownPlayer(target.clone()).into())
            })?;
        self.checker
            .expect_success(
                check,
                player,
                Operation::PlayerProfile {
                    player_id: target.clone(),
                },
                |r: &PlayerProfileData| {
                    ensure_eq("profile player id", target.as_str(), r.player.id.as_str())?;
                    ensure_eq("number of competitions played", 1, r.scores.len())?;
                    ensure_eq(
                        "competition title",
                        title.as_str(),
                        r.scores[0].competition_title.as_str(),
                    )?;
                    ensure_eq("score", score, r.scores[0].score)
                },
            )
            .await?;

        self.checker
            .expect_status(
                "player profile: unknown player",
                player,
                Operation::PlayerProfile {
                    player_id: "not-exist-player".to_string(),
                },
                404,
            )
            .await
    }

    // ── 8. Rankings while open ──

    async fn preliminary_rankings(
        &mut self,
        player: &dyn Agent,
        tenant: &str,
    ) -> Result<(), OracleError> {
        let competition_id = self.competition_id()?;
        let viewer_id = self.roster_id(0)?;
        let scored = self.model.scored_player_count();
        let limit = self.config.ranking_page_limit;

        let check = "competition ranking: unpaginated";
        self.checker
            .expect_success(
                check,
                player,
                ranking(&competition_id, ""),
                |r: &RankingData| {
                    invariants::ranking_within_bounds(&r.ranks, scored, limit)?;
                    invariants::ranking_is_ordered(&r.ranks)
                },
            )
            .await?;
        self.checker
            .model(check, self.model.record_ranking_view(&viewer_id))?;

        // Cursor just before the last ranked row: exactly that row comes back.
        let check = "competition ranking: paginated";
        let cursor = scored.saturating_sub(1).to_string();
        let rank_after = invariants::parse_rank_cursor(&cursor).unwrap_or(0);
        let expected_page = self.model.expected_page(rank_after, limit);
        self.checker
            .expect_success(
                check,
                player,
                ranking(&competition_id, &cursor),
                |r: &RankingData| {
                    ensure_eq("ranking rows after cursor", 1, r.ranks.len())?;
                    invariants::ranking_matches(&r.ranks, &expected_page)
                },
            )
            .await?;
        self.checker
            .model(check, self.model.record_ranking_view(&viewer_id))?;

        self.checker
            .expect_status(
                "competition ranking: unknown competition",
                player,
                ranking(UNKNOWN_COMPETITION_ID, ""),
                404,
            )
            .await?;

        let disqualified_id = self.roster_id(self.config.disqualified_index())?;
        let disqualified = self
            .acquire(
                "disqualified player account",
                Role::Player,
                tenant,
                &disqualified_id,
            )
            .await?;
        self.checker
            .expect_status(
                "competition ranking: disqualified viewer",
                disqualified.as_ref(),
                ranking(&competition_id, ""),
                403,
            )
            .await?;

        let check = "competition ranking: no-score viewer";
        let no_score_id = self.roster_id(self.config.no_score_index())?;
        let no_score = self
            .acquire("no-score player account", Role::Player, tenant, &no_score_id)
            .await?;
        self.checker
            .expect_success(
                check,
                no_score.as_ref(),
                ranking(&competition_id, ""),
                |r: &RankingData| invariants::ranking_within_bounds(&r.ranks, scored, limit),
            )
            .await?;
        self.checker
            .model(check, self.model.record_ranking_view(&no_score_id))
    }

    // ── 9-10. Finish and settle ──

    async fn finish_competition(&mut self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let check = "competition finish";
        self.checker
            .expect_success(
                check,
                organizer,
                Operation::FinishCompetition {
                    competition_id: self.competition_id()?,
                },
                |_: &EmptyData| Ok(()),
            )
            .await?;
        self.checker.model(check, self.model.finish_competition())?;

        self.checker
            .expect_status(
                "competition finish: unknown competition",
                organizer,
                Operation::FinishCompetition {
                    competition_id: UNKNOWN_COMPETITION_ID.to_string(),
                },
                404,
            )
            .await
    }

    async fn wait_for_settle(&self) -> Result<(), OracleError> {
        self.settle
            .wait(&self.checker.ctx)
            .await
            .map_err(|e| self.checker.fail("settle window", e))
    }

    // ── 11. Final ranking ──

    async fn final_ranking(&self, player: &dyn Agent) -> Result<(), OracleError> {
        let competition_id = self.competition_id()?;
        let disqualified_id = self.roster_id(self.config.disqualified_index())?;
        let expected = self.model.expected_page(0, self.config.ranking_page_limit);
        self.checker
            .expect_success(
                "competition ranking: final",
                player,
                ranking(&competition_id, ""),
                |r: &RankingData| {
                    invariants::ranking_is_ordered(&r.ranks)?;
                    invariants::ranking_includes(&r.ranks, &disqualified_id)?;
                    invariants::ranking_matches(&r.ranks, &expected)
                },
            )
            .await
            .map(|_| ())
    }

    // ── 12. Billing ──

    async fn organizer_billing(&self, organizer: &dyn Agent) -> Result<(), OracleError> {
        let competition_id = self.competition_id()?;
        let expected = self.model.expected_billing(&self.config.billing);
        tracing::debug!(
            scored_and_viewed = expected.scored_and_viewed,
            scored_only = expected.scored_only,
            viewed_only = expected.viewed_only,
            yen = expected.billing_yen,
            "expected billing"
        );
        self.checker
            .expect_success(
                "organizer billing",
                organizer,
                Operation::OrganizerBilling,
                |r: &BillingData| invariants::billing_matches(&r.reports, &competition_id, &expected),
            )
            .await
            .map(|_| ())
    }

    // ── 13. Player competition list ──

    async fn player_competitions(&self, player: &dyn Agent) -> Result<(), OracleError> {
        let competition_id = self.competition_id()?;
        self.checker
            .expect_success(
                "player competitions",
                player,
                Operation::PlayerCompetitions,
                |r: &CompetitionsData| {
                    ensure_eq("number of competitions in tenant", 1, r.competitions.len())?;
                    ensure_eq(
                        "competition id",
                        competition_id.as_str(),
                        r.competitions[0].id.as_str(),
                    )
                },
            )
            .await
            .map(|_| ())
    }

    // ── 14. Admin dashboard ──

    async fn tenants_dashboard(&self, admin: &dyn Agent) -> Result<(), OracleError> {
        let check = "tenants billing dashboard";
        let display_name = self
            .checker
            .model(check, self.model.tenant())?
            .display_name
            .clone();
        let mut page: TenantsBillingData = self
            .checker
            .expect_success(
                check,
                admin,
                Operation::TenantsBilling { before: None },
                |r: &TenantsBillingData| {
                    if r.tenants.is_empty() {
                        return Err(CheckError::violation(
                            "billing dashboard is empty",
                            ">= 1 tenant",
                            0,
                        ));
                    }
                    Ok(())
                },
            )
            .await?;

        // Tenants created later by concurrent runs push ours off the first page.
        let check = "tenants billing dashboard: next page";
        let mut cursors = HashSet::new();
        while !page.tenants.iter().any(|t| t.display_name == display_name) {
            let before = page
                .tenants
                .last()
                .map(|t| t.id.clone())
                .unwrap_or_default();
            if before.is_empty() || !cursors.insert(before.clone()) {
                return Err(self.checker.fail(
                    check,
                    CheckError::violation(
                        "billing dashboard cursor did not advance",
                        "unseen tenant id",
                        format!("{before:?}"),
                    ),
                ));
            }
            tracing::debug!(before = %before, "tenant not on dashboard page, following cursor");
            let want = display_name.clone();
            page = self
                .checker
                .expect_success(
                    check,
                    admin,
                    Operation::TenantsBilling {
                        before: Some(before),
                    },
                    move |r: &TenantsBillingData| {
                        if r.tenants.is_empty() {
                            return Err(CheckError::violation(
                                "created tenant missing from billing dashboard",
                                &want,
                                "absent",
                            ));
                        }
                        Ok(())
                    },
                )
                .await?;
        }
        Ok(())
    }
}

fn ranking(competition_id: &str, rank_after: &str) -> Operation {
    Operation::CompetitionRanking {
        competition_id: competition_id.to_string(),
        rank_after: rank_after.to_string(),
    }
}

/// Roster in requested (creation) order, regardless of response order.
fn order_roster(
    requested: &[String],
    players: &[PlayerDetail],
) -> Result<Vec<PlayerRecord>, CheckError> {
    requested
        .iter()
        .map(|name| {
            players
                .iter()
                .find(|p| &p.display_name == name)
                .map(|p| PlayerRecord {
                    id: p.id.clone(),
                    display_name: p.display_name.clone(),
                    disqualified: p.is_disqualified,
                })
                .ok_or_else(|| CheckError::violation("requested player not created", name, "absent"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_roster_follows_request_order() {
        let requested = vec!["p0".to_string(), "p1".to_string()];
        let players = vec![
            PlayerDetail {
                id: "id1".into(),
                display_name: "p1".into(),
                is_disqualified: false,
            },
            PlayerDetail {
                id: "id0".into(),
                display_name: "p0".into(),
                is_disqualified: false,
            },
        ];
        let roster = order_roster(&requested, &players).unwrap();
        assert_eq!(roster[0].id, "id0");
        assert_eq!(roster[1].id, "id1");
        assert!(order_roster(&["p2".to_string()], &players).is_err());
    }

    #[test]
    fn test_ranking_operation() {
        assert_eq!(
            ranking("c1", "5"),
            Operation::CompetitionRanking {
                competition_id: "c1".into(),
                rank_after: "5".into()
            }
        );
    }
}
