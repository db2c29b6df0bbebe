//! Fetch command
//!
//! The CLI is the loader's UI layer: it shows a spinner while an attempt is in
//! flight and decides, after each failure, whether to ask for a retry.

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use camino::Utf8Path;
use dialoguer::Confirm;
use infinder::{Source, SourceFetcher};
use infinder_core::loader::{LoadSnapshot, Phase, RetryLoader, TracingObserver};
use infinder_core::types::{LoadPolicy, RuntimeConfig};
use serde::Serialize;

use crate::cli::FetchArgs;
use crate::output;

/// JSON report printed with `--json`
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct FetchReport<'a> {
    source: String,
    bytes: Option<usize>,
    #[serde(flatten)]
    state: &'a LoadSnapshot<Vec<u8>>,
}

pub async fn run(args: FetchArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = super::load_runtime_config(config_path)?;
    let policy = resolve_policy(&config, &args);

    let source: Source = args.source.parse()?;
    let name = args
        .resource
        .clone()
        .unwrap_or_else(|| source.to_string());

    let fetcher = SourceFetcher::new(source, &config.network)?;
    let loader = RetryLoader::builder(fetcher.into_producer())
        .with_policy(policy)
        .with_observer(TracingObserver::new(name.clone()))
        .spawn();

    let mut snapshot = wait(&loader, &format!("Loading {}", name)).await;
    while snapshot.phase() == Phase::Failed {
        let message = snapshot
            .last_error()
            .map(|e| e.message().to_string())
            .unwrap_or_default();
        output::error(&format!("Failed to load {}: {}", name, message));

        if !snapshot.has_more_retries() || !should_retry(&args, &snapshot)? {
            break;
        }

        let outcome = loader.retry();
        if !outcome.is_scheduled() {
            tracing::debug!(outcome = ?outcome, "retry refused");
            break;
        }
        let retry_number = snapshot.attempt_count() + 1;
        snapshot = wait(
            &loader,
            &format!(
                "Retrying {} ({}/{})",
                name,
                retry_number,
                snapshot.max_attempts()
            ),
        )
        .await;
    }

    let body = snapshot.resource().map(|body| body.as_slice());

    if args.json {
        let report = FetchReport {
            source: args.source.clone(),
            bytes: body.map(<[u8]>::len),
            state: &snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(body) = body {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(body)
            .and_then(|_| stdout.flush())
            .context("Failed to write resource to stdout")?;
    }

    match snapshot.phase() {
        Phase::Loaded => {
            output::success(&format!(
                "Loaded {} ({} bytes, {} retries)",
                name,
                body.map(<[u8]>::len).unwrap_or_default(),
                snapshot.attempt_count()
            ));
            Ok(())
        }
        phase => Err(anyhow!(
            "{} unavailable after {} of {} retries (phase: {})",
            name,
            snapshot.attempt_count(),
            snapshot.max_attempts(),
            phase
        )),
    }
}

/// Configured policy for the resource, with CLI overrides applied
fn resolve_policy(config: &RuntimeConfig, args: &FetchArgs) -> LoadPolicy {
    let mut policy = match &args.resource {
        Some(resource) => config.loader.policy_for(resource),
        None => config.loader.default,
    };

    if let Some(max_retries) = args.max_retries {
        policy.max_retries = max_retries;
    }
    if let Some(retry_delay_ms) = args.retry_delay_ms {
        policy.retry_delay_ms = retry_delay_ms;
    }

    policy
}

/// Whether to spend another retry; asks the user with `--interactive`
fn should_retry<T>(args: &FetchArgs, snapshot: &LoadSnapshot<T>) -> Result<bool> {
    if !args.interactive {
        return Ok(true);
    }

    let remaining = snapshot
        .max_attempts()
        .saturating_sub(snapshot.attempt_count());
    let confirmed = Confirm::new()
        .with_prompt(format!("Retry? ({} left)", remaining))
        .default(true)
        .interact()?;

    if !confirmed {
        output::warning("Retry declined");
    }
    Ok(confirmed)
}

/// Show a spinner until the loader settles
async fn wait(loader: &RetryLoader<Vec<u8>>, msg: &str) -> LoadSnapshot<Vec<u8>> {
    let pb = output::spinner(msg);
    let snapshot = loader.settled().await;
    pb.finish_and_clear();

    if snapshot.phase() == Phase::Failed && !snapshot.has_more_retries() {
        output::info("No retries left");
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinder_core::types::LoaderConfig;
    use std::collections::HashMap;

    fn args(resource: Option<&str>) -> FetchArgs {
        FetchArgs {
            source: "campaigns.json".into(),
            resource: resource.map(String::from),
            max_retries: None,
            retry_delay_ms: None,
            interactive: false,
            json: false,
        }
    }

    fn config() -> RuntimeConfig {
        let mut resources = HashMap::new();
        resources.insert(
            "analytics".to_string(),
            LoadPolicy {
                max_retries: 5,
                retry_delay_ms: 2000,
            },
        );
        RuntimeConfig {
            loader: LoaderConfig {
                default: LoadPolicy::default(),
                resources,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_resolve_policy_uses_named_resource() {
        let policy = resolve_policy(&config(), &args(Some("analytics")));
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.retry_delay_ms, 2000);
    }

    #[test]
    fn test_resolve_policy_applies_cli_overrides() {
        let mut args = args(Some("analytics"));
        args.max_retries = Some(0);
        let policy = resolve_policy(&config(), &args);
        assert_eq!(policy.max_retries, 0);
        assert_eq!(policy.retry_delay_ms, 2000);
    }

    #[test]
    fn test_resolve_policy_defaults_without_resource() {
        let policy = resolve_policy(&config(), &args(None));
        assert_eq!(policy, LoadPolicy::default());
    }

    #[test]
    fn test_non_interactive_always_retries() {
        let loader = RetryLoader::builder(|| async { Ok::<_, anyhow::Error>(Vec::<u8>::new()) }).build();
        let snapshot = loader.snapshot();
        assert!(should_retry(&args(None), &snapshot).unwrap());
    }
}
