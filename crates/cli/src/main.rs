//! Terminal front-end for the sift screening tracker.
//!
//! Submits a batch of documents against a job description, watches the
//! store until every job settles or stalls, then prints the ranked
//! result table and summary statistics.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sift_core::view::{FilterTag, SortOrder};
use sift_screener::messages::DocumentUpload;
use sift_screener::{ScreenerApi, ScreenerConfig};
use sift_tracker::ScreeningTracker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Track a screening batch to completion", long_about = None)]
struct Args {
    /// Candidate documents to submit (.pdf / .docx)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to a file containing the job description text
    #[arg(short, long)]
    jd_file: PathBuf,

    /// Filter for the result table: all, shortlisted, review, rejected,
    /// invalid, pending
    #[arg(short, long, default_value = "all")]
    filter: String,

    /// Sort order for the result table: recent, score-high, score-low
    #[arg(short, long, default_value = "recent")]
    sort: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sift=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let filter: FilterTag = args.filter.parse().map_err(|e| anyhow::anyhow!("{e}"))?;
    let sort: SortOrder = args.sort.parse().map_err(|e| anyhow::anyhow!("{e}"))?;

    let jd_text = std::fs::read_to_string(&args.jd_file)
        .with_context(|| format!("reading job description from {}", args.jd_file.display()))?;

    let mut documents = Vec::new();
    for path in &args.files {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading document {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        documents.push(DocumentUpload { file_name, bytes });
    }

    let config = ScreenerConfig::from_env();
    tracing::info!(api_url = %config.api_url, "Connecting to screening backend");

    let api = Arc::new(ScreenerApi::new(&config));
    let tracker = ScreeningTracker::new(api);

    let outcome = tracker.submit_batch(jd_text.trim(), &documents).await?;
    for rejected in &outcome.rejected {
        eprintln!("rejected: {} ({})", rejected.file_name, rejected.reason);
    }
    if outcome.accepted.is_empty() {
        anyhow::bail!("no document was accepted for screening");
    }
    println!(
        "Tracking {} document(s); waiting for results...",
        outcome.accepted.len()
    );

    // Report progress as jobs settle, until every watcher has stopped.
    let mut events = tracker.subscribe();
    let progress_store = tracker.store().clone();
    let reporter = tokio::spawn(async move {
        while events.recv().await.is_ok() {
            if let Ok(snapshot) = progress_store.snapshot().await {
                let progress = sift_core::view::BatchProgress::compute(&snapshot);
                eprintln!("  {}/{} settled", progress.settled, progress.total);
            }
        }
    });

    tracker.wait_settled().await;
    reporter.abort();

    print_results(&tracker, filter, sort).await?;
    tracker.shutdown().await;
    Ok(())
}

async fn print_results(
    tracker: &ScreeningTracker,
    filter: FilterTag,
    sort: SortOrder,
) -> anyhow::Result<()> {
    let rows = tracker.view(filter, sort).await?;
    let ranks = tracker.ranks().await?;
    let stats = tracker.stats().await?;

    println!();
    println!(
        "{:<16} {:<20} {:<16} {:>7}  {:<12} {:>5}",
        "ID", "CANDIDATE", "STATUS", "SCORE", "DECISION", "RANK"
    );
    for row in &rows {
        let score = row
            .final_score
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".into());
        let decision = row
            .decision
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        let rank = ranks
            .rank(&row.id)
            .map(|r| format!("#{r}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<16} {:<20} {:<16} {:>7}  {:<12} {:>5}",
            row.id,
            row.candidate_name.as_deref().unwrap_or("Unknown"),
            row.status.to_string(),
            score,
            decision,
            rank,
        );
        if let Some(message) = &row.error_message {
            println!("    {message}");
        }
    }

    println!();
    println!(
        "{} total | {} processed | {} shortlisted | {} review | {} rejected | {} invalid | {} pending",
        stats.total,
        stats.processed,
        stats.shortlisted,
        stats.review,
        stats.rejected,
        stats.invalid,
        stats.pending,
    );
    if let Some(avg) = stats.average_score {
        println!("average score: {avg:.1}");
    }
    if let Some(rate) = stats.acceptance_rate {
        println!("acceptance rate: {rate:.1}%");
    }
    Ok(())
}
