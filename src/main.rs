use anyhow::{Context, Result};
use indexmap::IndexMap;
use pcscraper::{
    config::{ExtractPlan, TableOutput},
    tree::html::parse_document,
};
use rayon::prelude::*;
use serde::Serialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::exit,
    time::Instant,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tables: Option<IndexMap<String, TableOutput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    // ─── 2) args ─────────────────────────────────────────────────────
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <PLAN> <HTML>...", args[0]);
        exit(1);
    }
    let plan = ExtractPlan::load(&args[1])?;
    let files: Vec<PathBuf> = args[2..].iter().map(PathBuf::from).collect();
    info!(
        tables = plan.tables.len(),
        files = files.len(),
        "startup"
    );

    // ─── 3) extract every document in parallel ───────────────────────
    let started = Instant::now();
    let reports: Vec<FileReport> = files
        .par_iter()
        .map(|path| {
            let file = path.display().to_string();
            match extract_file(&plan, path) {
                Ok(tables) => FileReport {
                    file,
                    tables: Some(tables),
                    error: None,
                },
                Err(e) => {
                    error!(file = %file, error = ?e, "extraction failed");
                    FileReport {
                        file,
                        tables: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            }
        })
        .collect();

    // ─── 4) report ───────────────────────────────────────────────────
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    for report in &reports {
        println!("{}", serde_json::to_string(report)?);
    }
    info!(
        files = reports.len(),
        failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "done"
    );

    if failed > 0 {
        exit(2);
    }
    Ok(())
}

/// Parse one HTML file and run the plan on it. The document never leaves
/// this worker.
fn extract_file(plan: &ExtractPlan, path: &Path) -> Result<IndexMap<String, TableOutput>> {
    let markup = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let doc = parse_document(&markup);
    Ok(plan.run(&doc))
}
