use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::info;

use gigabrands_hiring::config::WorkableConfig;
use gigabrands_hiring::{init_tracing, AppContext};

const USAGE: &str = "usage: gigabrands-hiring <command> [args]

commands:
  sync [--force]                          fetch all candidates into the cache
  jobs [--force]                          per-job stage breakdown
  role-metrics <role-id> <title>... [--force]
                                          stage breakdown across mapped job titles
  ceo-review                              candidates awaiting CEO review (cache only)
  candidate <id>                          candidate details
  comments <id>                           candidate comments
  schedule <id> <interviewer> [--member <id>]
                                          move to set_interview and tag interviewer
  stats                                   memory cache statistics after loading the snapshot";

#[tokio::main]
async fn main() -> Result<()> {
    let config = WorkableConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_format);

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let force = take_flag(&mut args, "--force");
    let member = take_option(&mut args, "--member")?;
    let Some(command) = (!args.is_empty()).then(|| args.remove(0)) else {
        bail!("{USAGE}");
    };

    let ctx = AppContext::new(config)?;

    match (command.as_str(), args.as_slice()) {
        ("sync", []) => {
            let candidates = ctx.fetcher.fetch_all_candidates(!force).await?;
            info!(count = candidates.len(), "sync complete");
            print_json(&serde_json::json!({ "candidates": candidates.len() }))?;
        }
        ("jobs", []) => {
            print_json(&ctx.hiring.sync_job_metrics(force).await?)?;
        }
        ("role-metrics", [role_id, titles @ ..]) if !titles.is_empty() => {
            let role_id: i64 = role_id
                .parse()
                .with_context(|| format!("role id must be a number, got {role_id:?}"))?;
            print_json(&ctx.hiring.sync_role_metrics(role_id, titles, force).await?)?;
        }
        ("ceo-review", []) => {
            print_json(&ctx.hiring.ceo_review_candidates().await)?;
        }
        ("candidate", [id]) => {
            print_json(&ctx.client.fetch_candidate_details(id).await?)?;
        }
        ("comments", [id]) => {
            print_json(&ctx.client.fetch_candidate_comments(id).await?)?;
        }
        ("schedule", [id, interviewer]) => {
            ctx.client
                .schedule_interview_with_tag(id, interviewer, member.as_deref())
                .await?;
            print_json(&serde_json::json!({ "scheduled": id, "interviewer": interviewer }))?;
        }
        ("stats", []) => {
            ctx.fetcher.cached_candidates().await;
            print_json(&serde_json::json!({
                "cache": ctx.cache.stats(),
                "metrics": ctx.metrics.snapshot(),
            }))?;
        }
        _ => bail!("{USAGE}"),
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("{name} needs a value");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
