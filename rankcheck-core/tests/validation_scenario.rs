//! End-to-end oracle runs against the in-process platform.
//!
//! A clean platform must pass every check; each injected fault must be caught
//! at the check that exercises it, and nowhere earlier.

use std::sync::Arc;
use std::time::Duration;

use rankcheck_core::assertion::decode_payload;
use rankcheck_core::types::{BillingData, PlayersData, RankingData};
use rankcheck_core::{
    AccountProvider, CheckOutcome, MemoryPlatform, MemorySink, Operation, OracleConfig,
    OracleError, PlatformFault, PlatformOptions, Role, RunContext, RunSummary, SequenceAllocator,
    ValidationRun,
};
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Checks a clean run passes; settle is not a check.
const CHECKS_PER_RUN: usize = 25;

async fn run_once(
    platform: &MemoryPlatform,
    config: OracleConfig,
    run: u64,
    ctx: RunContext,
) -> (Result<RunSummary, OracleError>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let result = ValidationRun::new(
        run,
        Arc::new(config),
        Arc::new(platform.clone()),
        sink.clone(),
        ctx,
    )
    .execute()
    .await;
    (result, sink)
}

// ── Clean platform ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn clean_platform_passes_every_check() {
    let platform = MemoryPlatform::new();
    let (result, sink) =
        run_once(&platform, OracleConfig::default(), 1, RunContext::detached()).await;

    let summary = result.unwrap();
    assert_eq!(summary.tenant_name, "valid-tenantid-1");
    assert_eq!(summary.checks_passed, CHECKS_PER_RUN);

    let records = sink.records();
    assert_eq!(records.len(), CHECKS_PER_RUN);
    assert!(records.iter().all(|r| r.outcome.is_passed()));
    let names: Vec<_> = records.iter().map(|r| r.check.as_str()).collect();
    assert_eq!(names.first(), Some(&"tenant add"));
    assert!(names.contains(&"score upload: superseded"));
    assert!(names.contains(&"competition ranking: final"));
    assert_eq!(names.last(), Some(&"tenants billing dashboard"));

    // The reference scenario bills 100 + 50 * 18 + 10.
    let organizer = platform
        .agent(Role::Organizer, &summary.tenant_name, "organizer")
        .await
        .unwrap();
    let resp = organizer.send(&Operation::OrganizerBilling).await.unwrap();
    let reports = decode_payload::<BillingData>(&resp.body).unwrap().reports;
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].competition_id, summary.competition_id);
    assert_eq!(reports[0].billing_yen, 1010);
}

#[tokio::test(start_paused = true)]
async fn resubmission_check_can_be_disabled() {
    let platform = MemoryPlatform::new();
    let config = OracleConfig {
        verify_resubmission: false,
        ..OracleConfig::default()
    };
    let (result, sink) = run_once(&platform, config, 1, RunContext::detached()).await;
    assert_eq!(result.unwrap().checks_passed, CHECKS_PER_RUN - 1);
    assert!(sink
        .records()
        .iter()
        .all(|r| r.check != "score upload: superseded"));
}

#[tokio::test(start_paused = true)]
async fn smaller_roster_still_passes() {
    let platform = MemoryPlatform::new();
    let config = OracleConfig::from_yaml("player_count: 5\nprofile_player_index: 1\n").unwrap();
    let (result, _) = run_once(&platform, config, 3, RunContext::detached()).await;
    assert_eq!(result.unwrap().tenant_name, "valid-tenantid-3");
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_share_one_platform() {
    let platform = MemoryPlatform::new();
    let runs = SequenceAllocator::new();
    let sink = Arc::new(MemorySink::new());
    let config = Arc::new(OracleConfig::default());

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let run = ValidationRun::new(
            runs.next(),
            config.clone(),
            Arc::new(platform.clone()),
            sink.clone(),
            RunContext::detached(),
        );
        set.spawn(run.execute());
    }

    let mut tenants = Vec::new();
    while let Some(joined) = set.join_next().await {
        tenants.push(joined.unwrap().unwrap().tenant_name);
    }
    tenants.sort();
    tenants.dedup();
    assert_eq!(tenants.len(), 8);
    assert_eq!(platform.tenant_count(), 8);
    assert_eq!(sink.records().len(), 8 * CHECKS_PER_RUN);
    assert_eq!(sink.for_run(5).len(), CHECKS_PER_RUN);
}

#[tokio::test(start_paused = true)]
async fn dashboard_check_follows_cursor_past_first_page() {
    let platform = MemoryPlatform::new();
    let runs = SequenceAllocator::new();
    let sink = Arc::new(MemorySink::new());
    let config = Arc::new(OracleConfig::default());

    // Every tenant exists before any run leaves its settle window, so the
    // two oldest fall off the ten-row first page.
    let mut set = JoinSet::new();
    for _ in 0..12 {
        let run = ValidationRun::new(
            runs.next(),
            config.clone(),
            Arc::new(platform.clone()),
            sink.clone(),
            RunContext::detached(),
        );
        set.spawn(run.execute());
    }
    while let Some(joined) = set.join_next().await {
        joined.unwrap().unwrap();
    }

    let records = sink.records();
    assert_eq!(platform.tenant_count(), 12);
    assert!(records.iter().all(|r| r.outcome.is_passed()));
    let paged = records
        .iter()
        .filter(|r| r.check == "tenants billing dashboard: next page")
        .count();
    assert_eq!(paged, 2);
    assert_eq!(records.len(), 12 * CHECKS_PER_RUN + paged);
}

#[tokio::test(start_paused = true)]
async fn thousand_player_roster_passes() {
    let platform = MemoryPlatform::new();
    let config = OracleConfig::from_yaml("player_count: 1000\n").unwrap();
    let (result, sink) = run_once(&platform, config, 1, RunContext::detached()).await;
    assert_eq!(result.unwrap().checks_passed, CHECKS_PER_RUN);
    assert!(sink.records().iter().all(|r| r.outcome.is_passed()));
}

#[tokio::test(start_paused = true)]
async fn rankings_cap_at_one_hundred_rows() {
    let platform = MemoryPlatform::new();
    let config = OracleConfig::from_yaml("player_count: 150\n").unwrap();
    let (result, _) = run_once(&platform, config, 1, RunContext::detached()).await;
    let summary = result.unwrap();

    let organizer = platform
        .agent(Role::Organizer, &summary.tenant_name, "organizer")
        .await
        .unwrap();
    let resp = organizer.send(&Operation::ListPlayers).await.unwrap();
    let players = decode_payload::<PlayersData>(&resp.body).unwrap().players;
    assert_eq!(players.len(), 150);
    let viewer = players.iter().find(|p| !p.is_disqualified).unwrap();
    let player = platform
        .agent(Role::Player, &summary.tenant_name, &viewer.id)
        .await
        .unwrap();

    let page = |rank_after: &str| Operation::CompetitionRanking {
        competition_id: summary.competition_id.clone(),
        rank_after: rank_after.to_string(),
    };
    let ranks = |body: Vec<u8>| decode_payload::<RankingData>(&body).unwrap().ranks;

    let first = ranks(player.send(&page("")).await.unwrap().body);
    assert_eq!(first.len(), 100);
    assert_eq!(first[0].rank, 1);
    assert_eq!(first[99].rank, 100);

    let rest = ranks(player.send(&page("100")).await.unwrap().body);
    let ranked = 100 + rest.len();
    assert!(ranked > 100 && ranked < 150);
    let lowest = rest.last().unwrap();
    assert_eq!(lowest.rank, ranked as i64);

    let tail = ranks(
        player
            .send(&page(&(ranked - 1).to_string()))
            .await
            .unwrap()
            .body,
    );
    assert_eq!(tail, vec![lowest.clone()]);
    assert!(first.iter().chain(&rest).all(|r| r.score >= lowest.score));
}

// ── Fault injection ────────────────────────────────────────────

async fn assert_caught(fault: PlatformFault, expected_check: &str) {
    let platform = MemoryPlatform::with_options(PlatformOptions::default().with_fault(fault));
    let (result, sink) =
        run_once(&platform, OracleConfig::default(), 1, RunContext::detached()).await;

    let err = result.unwrap_err();
    assert_eq!(err.check, expected_check, "{fault:?}: {err}");

    let records = sink.records();
    let (last, earlier) = records.split_last().unwrap();
    assert_eq!(last.check, expected_check);
    assert!(matches!(last.outcome, CheckOutcome::Failed(_)));
    assert!(earlier.iter().all(|r| r.outcome.is_passed()), "{fault:?}");
}

#[tokio::test(start_paused = true)]
async fn detects_duplicate_tenant_acceptance() {
    assert_caught(
        PlatformFault::AcceptDuplicateTenants,
        "tenant add: duplicate name",
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn detects_appended_scores() {
    assert_caught(
        PlatformFault::AppendScores,
        "competition ranking: unpaginated",
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn detects_ignored_rank_cursor() {
    assert_caught(
        PlatformFault::IgnoreRankAfter,
        "competition ranking: paginated",
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn detects_disqualified_player_hidden_from_ranking() {
    assert_caught(
        PlatformFault::HideDisqualifiedFromRanking,
        "competition ranking: paginated",
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn detects_disqualified_viewer_allowed() {
    assert_caught(
        PlatformFault::LetDisqualifiedView,
        "competition ranking: disqualified viewer",
    )
    .await;
}

#[tokio::test(start_paused = true)]
async fn detects_flat_billing() {
    assert_caught(PlatformFault::FlatBilling, "organizer billing").await;
}

// ── Settle window ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn aggregation_lag_within_settle_window_passes() {
    let platform = MemoryPlatform::with_options(
        PlatformOptions::default().with_finish_lag(Duration::from_millis(500)),
    );
    let (result, _) = run_once(&platform, OracleConfig::default(), 1, RunContext::detached()).await;
    result.unwrap();
}

#[tokio::test(start_paused = true)]
async fn aggregation_lag_beyond_settle_window_fails_billing() {
    let platform = MemoryPlatform::with_options(
        PlatformOptions::default().with_finish_lag(Duration::from_secs(5)),
    );
    let (result, _) = run_once(&platform, OracleConfig::default(), 1, RunContext::detached()).await;
    let err = result.unwrap_err();
    assert_eq!(err.check, "organizer billing");
    assert!(err.to_string().contains("want: 1010, got: 0"), "{err}");
}

// ── Cancellation ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn deadline_during_settle_reports_incomplete() {
    let platform = MemoryPlatform::new();
    let ctx = RunContext::detached().with_deadline(Instant::now() + Duration::from_millis(500));
    let (result, sink) = run_once(&platform, OracleConfig::default(), 1, ctx).await;

    let err = result.unwrap_err();
    assert_eq!(err.check, "settle window");
    assert!(err.kind.is_cancelled());
    let records = sink.records();
    let last = records.last().unwrap();
    assert!(matches!(last.outcome, CheckOutcome::Incomplete(_)));
    // Everything before the settle window completed.
    assert_eq!(records.len(), 22);
}

#[tokio::test]
async fn cancelled_before_start_issues_nothing() {
    let platform = MemoryPlatform::new();
    let (handle, ctx) = RunContext::new();
    handle.cancel();
    let (result, sink) = run_once(&platform, OracleConfig::default(), 1, ctx).await;

    let err = result.unwrap_err();
    assert_eq!(err.check, "admin account");
    assert!(err.kind.is_cancelled());
    assert_eq!(platform.tenant_count(), 0);
    assert!(matches!(
        sink.records()[0].outcome,
        CheckOutcome::Incomplete(_)
    ));
}
