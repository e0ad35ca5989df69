//! rankcheck: run the conformance oracle against a ranking platform.
//!
//! ```text
//! rankcheck --target-url https://localhost/ --domain t.isucon.dev \
//!     --resolve 127.0.0.1:443 --jwt-key isuports.pem --runs 4
//! rankcheck --in-process            # self-test against the memory platform
//! ```

mod http_agent;
mod report;
mod token;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use rankcheck_core::{
    AccountProvider, MemoryPlatform, OracleConfig, RunContext, SequenceAllocator, StepSink,
    TeeSink, TracingSink, ValidationRun,
};

use crate::http_agent::{HttpProvider, HttpTarget};
use crate::report::{format_run, ConsoleSink};
use crate::token::TokenMinter;

#[derive(Parser, Debug)]
#[command(
    name = "rankcheck",
    version,
    about = "Behavioural conformance oracle for the competition ranking platform"
)]
struct Args {
    /// Scenario configuration (YAML). Defaults reproduce the reference scenario.
    #[arg(long, env = "RANKCHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Scheme and port of the platform; the host is replaced per tenant.
    #[arg(long, env = "RANKCHECK_TARGET_URL", default_value = "https://localhost/")]
    target_url: Url,

    /// Parent domain of tenant hosts.
    #[arg(long, env = "RANKCHECK_DOMAIN", default_value = "t.isucon.dev")]
    domain: String,

    /// Connect every platform host to this address instead of resolving it.
    #[arg(long, env = "RANKCHECK_RESOLVE")]
    resolve: Option<SocketAddr>,

    /// RSA private key (PEM) used to sign session tokens.
    #[arg(long, env = "RANKCHECK_JWT_KEY", conflicts_with = "jwt_secret")]
    jwt_key: Option<PathBuf>,

    /// Shared HS256 secret used to sign session tokens.
    #[arg(long, env = "RANKCHECK_JWT_SECRET")]
    jwt_secret: Option<String>,

    /// Concurrent oracle runs, each on its own tenant.
    #[arg(long, default_value_t = 1)]
    runs: u64,

    /// Cancel every run still going after this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    /// Run against the built-in memory platform instead of a live target.
    #[arg(long)]
    in_process: bool,

    /// Emit JSON lines instead of coloured text.
    #[arg(long)]
    json: bool,
}

fn load_config(path: Option<&Path>) -> Result<OracleConfig> {
    let config = match path {
        Some(path) => OracleConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OracleConfig::default(),
    };
    Ok(config.with_env_overrides()?)
}

fn build_provider(args: &Args) -> Result<Arc<dyn AccountProvider>> {
    if args.in_process {
        tracing::info!("using in-process memory platform");
        return Ok(Arc::new(MemoryPlatform::new()));
    }
    let minter = match (&args.jwt_key, &args.jwt_secret) {
        (Some(path), _) => {
            let pem = std::fs::read(path)
                .with_context(|| format!("reading JWT key {}", path.display()))?;
            TokenMinter::from_rsa_pem(&pem)?
        }
        (None, Some(secret)) => TokenMinter::from_secret(secret.as_bytes()),
        (None, None) => bail!("--jwt-key or --jwt-secret is required against a live platform"),
    };
    let target = HttpTarget {
        base: args.target_url.clone(),
        domain: args.domain.clone(),
        resolve: args.resolve,
        timeout: Duration::from_secs(args.request_timeout_secs),
    };
    tracing::info!(
        target = %target.base,
        domain = %target.domain,
        resolve = ?target.resolve,
        "using live platform"
    );
    Ok(Arc::new(HttpProvider::new(target, minter)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable with --json.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rankcheck=info,rankcheck_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Arc::new(load_config(args.config.as_deref())?);
    tracing::info!(
        players = config.player_count,
        settle_ms = config.settle_window_ms,
        runs = args.runs,
        "configuration loaded"
    );

    let provider = build_provider(&args)?;
    let sink: Arc<dyn StepSink> = Arc::new(TeeSink(vec![
        Arc::new(TracingSink),
        Arc::new(ConsoleSink::new(args.json)),
    ]));

    let (cancel, mut ctx) = RunContext::new();
    if let Some(secs) = args.deadline_secs {
        ctx = ctx.with_deadline(tokio::time::Instant::now() + Duration::from_secs(secs));
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling runs at the next check");
            cancel.cancel();
        }
    });

    let run_ids = SequenceAllocator::new();
    let mut runs = JoinSet::new();
    for _ in 0..args.runs.max(1) {
        let run = ValidationRun::new(
            run_ids.next(),
            config.clone(),
            provider.clone(),
            sink.clone(),
            ctx.clone(),
        );
        runs.spawn(async move {
            let id = run.run_id();
            (id, run.execute().await)
        });
    }

    let mut failed = 0usize;
    let mut total = 0usize;
    while let Some(joined) = runs.join_next().await {
        let (id, result) = joined.context("oracle run panicked")?;
        total += 1;
        if result.is_err() {
            failed += 1;
        }
        println!("{}", format_run(id, &result, args.json));
    }

    if failed > 0 {
        if !args.json {
            println!("{} {failed}/{total} runs failed", "FAIL".red().bold());
        }
        std::process::exit(1);
    }
    if !args.json {
        println!("{} {total}/{total} runs passed", "OK".green().bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_live_target() {
        let args = Args::try_parse_from([
            "rankcheck",
            "--target-url",
            "https://localhost:8443/",
            "--resolve",
            "127.0.0.1:8443",
            "--jwt-secret",
            "s3cret",
            "--runs",
            "4",
        ])
        .unwrap();
        assert_eq!(args.runs, 4);
        assert_eq!(args.resolve, Some("127.0.0.1:8443".parse().unwrap()));
        assert!(build_provider(&args).is_ok());
    }

    #[test]
    fn test_key_and_secret_conflict() {
        let err = Args::try_parse_from([
            "rankcheck",
            "--jwt-key",
            "a.pem",
            "--jwt-secret",
            "s",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_live_target_requires_signing_key() {
        let mut args = Args::try_parse_from(["rankcheck"]).unwrap();
        // RANKCHECK_JWT_* in the environment must not mask the missing key.
        args.jwt_key = None;
        args.jwt_secret = None;
        args.in_process = false;
        let err = build_provider(&args).err().expect("provider without a signing key");
        assert!(err.to_string().contains("--jwt-key or --jwt-secret"));
    }

    #[test]
    fn test_default_config_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.player_count, 20);
    }
}
