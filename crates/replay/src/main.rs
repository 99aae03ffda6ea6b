mod trace;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::io::{BufReader, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use throttlegate_common::AppConfig;
use throttlegate_rate_limit::{rejection_response, AdmissionController, Decision, StatsSnapshot};

use crate::trace::{parse_trace, TraceEntry};

const DEFAULT_CONFIG_PATH: &str = "config/throttlegate.yaml";

#[derive(Serialize)]
struct ReplayRecord<'a> {
    offset_ms: u64,
    key: &'a str,
    decision: Decision,
    status: u16,
    message: Option<String>,
}

#[derive(Serialize)]
struct ReplaySummary {
    requests: usize,
    tracked_keys: usize,
    stats: StatsSnapshot,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays a clean JSON stream.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let trace_path = args.next();

    let config = load_config(&config_path)?;
    let controller = AdmissionController::from_config(&config.rate_limit)
        .context("invalid rate_limit configuration")?;

    let entries = match trace_path {
        Some(ref path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open trace {path}"))?;
            parse_trace(BufReader::new(file))?
        }
        None => parse_trace(std::io::stdin().lock())?,
    };
    info!(requests = entries.len(), "replaying trace");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let cleanup_interval = Duration::from_secs(config.rate_limit.cleanup_interval_secs);
    replay(&controller, &entries, cleanup_interval, &mut out)?;

    let summary = ReplaySummary {
        requests: entries.len(),
        tracked_keys: controller.tracked_keys(),
        stats: controller.stats(),
    };
    serde_json::to_writer(&mut out, &summary)?;
    writeln!(out)?;

    info!(
        admitted = summary.stats.admitted,
        denied = summary.stats.denied(),
        "replay finished"
    );
    Ok(())
}

fn load_config(path: &str) -> Result<AppConfig> {
    if path == DEFAULT_CONFIG_PATH && !Path::new(path).exists() {
        info!(path, "no configuration file found, using defaults");
        return Ok(AppConfig::default());
    }

    info!(path, "loading configuration");
    AppConfig::load(path).with_context(|| format!("failed to load configuration from {path}"))
}

/// Run every entry through `controller`, writing one JSON line per request.
///
/// Stale client state is swept every `cleanup_interval` of trace time.
fn replay(
    controller: &AdmissionController,
    entries: &[TraceEntry],
    cleanup_interval: Duration,
    out: &mut impl Write,
) -> Result<()> {
    let base = Instant::now();
    // `None` once the next sweep would fall outside the `Instant` range.
    let mut next_cleanup = base.checked_add(cleanup_interval);

    for entry in entries {
        let now = base
            .checked_add(Duration::from_millis(entry.offset_ms))
            .ok_or_else(|| anyhow!("offset {} ms is out of range", entry.offset_ms))?;
        if next_cleanup.is_some_and(|at| now >= at) {
            controller.cleanup_at(now);
            next_cleanup = now.checked_add(cleanup_interval);
        }
        let decision = controller.check_at(&entry.key, now);

        let (status, message) = match rejection_response(&decision) {
            Some(response) => (
                response.status().as_u16(),
                Some(response.body().trim_end().to_string()),
            ),
            None => (200, None),
        };

        let record = ReplayRecord {
            offset_ms: entry.offset_ms,
            key: &entry.key,
            decision,
            status,
            message,
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use throttlegate_rate_limit::Policy;

    #[test]
    fn replay_emits_one_line_per_request() {
        let policy = Policy::new(
            2,
            Duration::from_secs(5),
            3,
            Duration::from_secs(60),
            false,
        )
        .unwrap();
        let controller = AdmissionController::new(policy);
        let entries = parse_trace("0 X\n1000 X\n2000 X\n".as_bytes()).unwrap();

        let mut out = Vec::new();
        replay(&controller, &entries, Duration::from_secs(60), &mut out).unwrap();

        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["status"], 200);
        assert_eq!(lines[1]["decision"]["outcome"], "admitted");
        assert_eq!(lines[2]["status"], 429);
        assert_eq!(lines[2]["decision"]["reason"], "rate_limited");
        assert_eq!(
            lines[2]["message"],
            "Too many requests. Please try again in 5 seconds."
        );
    }

    #[test]
    fn replay_sweeps_idle_clients() {
        let controller = AdmissionController::new(Policy::default());
        let entries = parse_trace("0 a\n0 b\n30000 c\n".as_bytes()).unwrap();

        let mut out = Vec::new();
        replay(&controller, &entries, Duration::from_secs(10), &mut out).unwrap();

        assert_eq!(controller.tracked_keys(), 1);
        assert_eq!(controller.stats().admitted, 3);
    }

    #[test]
    fn replay_tolerates_huge_cleanup_interval() {
        let controller = AdmissionController::new(Policy::default());
        let entries = parse_trace("0 a\n1000 a\n".as_bytes()).unwrap();

        let mut out = Vec::new();
        replay(&controller, &entries, Duration::from_secs(u64::MAX), &mut out).unwrap();

        assert_eq!(controller.tracked_keys(), 1);
        assert_eq!(controller.stats().admitted, 2);
    }
}
