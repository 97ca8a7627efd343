use clap::Parser;
use repotext_ingest::{IngestOutput, Ingestor, RepoUrl, RequestSupervisor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const EXIT_INGEST_FAILED: i32 = 1;
const EXIT_INVALID_URL: i32 = 2;
const EXIT_TIMEOUT: i32 = 3;

const TREE_HEADER: &str = "Directory structure:";
const CONTENT_HEADER: &str = "Files content:";
const SECTION_SEPARATOR: &str = "================================================";

#[derive(Parser)]
#[command(name = "repotext")]
#[command(about = "Turn a remote Git repository into a normalized text digest", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository URL: provider browse URL, direct .git URL, or SSH form
    url: String,

    /// Additional ignore globs, applied on top of the built-in defaults
    /// and the repository's own .gitignore
    #[arg(short = 'e', long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Ingest this branch instead of the repository default
    #[arg(long)]
    branch: Option<String>,

    /// Write the digest to this file (or directory, as <repo>.txt)
    /// instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort the request after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    if cli.url.trim().is_empty() {
        eprintln!("error: missing repository URL");
        return EXIT_INVALID_URL;
    }

    // Invalid references are rejected before any resource allocation.
    let mut repo = match RepoUrl::parse(&cli.url) {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("error: {err}");
            return EXIT_INVALID_URL;
        }
    };
    if cli.branch.is_some() {
        repo.branch = cli.branch.clone();
    }

    let ingestor = match Ingestor::new() {
        Ok(ingestor) => Arc::new(ingestor),
        Err(err) => {
            eprintln!("error: ingestion failed: {err}");
            return EXIT_INGEST_FAILED;
        }
    };

    let supervisor = Arc::new(RequestSupervisor::new());
    let pipeline = {
        let ingestor = Arc::clone(&ingestor);
        let supervisor = Arc::clone(&supervisor);
        let exclude = cli.exclude.clone();
        let repo = repo.clone();
        tokio::spawn(async move {
            let result = ingestor.ingest_ref(&repo, &exclude).await;
            if supervisor.try_complete() {
                Some(result)
            } else {
                // The deadline already answered; drop the late result.
                log::warn!("pipeline finished after the deadline, discarding result");
                None
            }
        })
    };

    let deadline = Duration::from_secs(cli.timeout_secs);
    match tokio::time::timeout(deadline, pipeline).await {
        Ok(Ok(Some(Ok(output)))) => emit(&cli, &repo, &output),
        Ok(Ok(Some(Err(err)))) => {
            eprintln!("error: ingestion failed: {err}");
            EXIT_INGEST_FAILED
        }
        Ok(Ok(None)) => timed_out(&ingestor, cli.timeout_secs),
        Ok(Err(err)) => {
            eprintln!("error: ingestion failed: {err}");
            EXIT_INGEST_FAILED
        }
        Err(_elapsed) => {
            // The pipeline task keeps running detached; in-flight IO may
            // finish in the background after this response is sent.
            supervisor.try_timeout();
            timed_out(&ingestor, cli.timeout_secs)
        }
    }
}

fn timed_out(ingestor: &Ingestor, timeout_secs: u64) -> i32 {
    ingestor.workdirs().sweep_all();
    eprintln!("error: request timed out after {timeout_secs}s");
    EXIT_TIMEOUT
}

fn emit(cli: &Cli, repo: &RepoUrl, output: &IngestOutput) -> i32 {
    let digest = normalized(output);
    match destination(cli, repo) {
        Some(path) => {
            if let Err(err) = std::fs::write(&path, digest) {
                eprintln!("error: could not write {}: {err}", path.display());
                return EXIT_INGEST_FAILED;
            }
            log::info!("digest written to {}", path.display());
        }
        None => print!("{digest}"),
    }
    0
}

/// Fixed header + tree + separator + fixed header + content.
fn normalized(output: &IngestOutput) -> String {
    format!(
        "{TREE_HEADER}\n{}\n{SECTION_SEPARATOR}\n{CONTENT_HEADER}\n\n{}",
        output.tree, output.content
    )
}

fn destination(cli: &Cli, repo: &RepoUrl) -> Option<PathBuf> {
    let path = cli.output.as_ref()?;
    if path.is_dir() {
        Some(path.join(format!("{}.txt", digest_stem(repo))))
    } else {
        Some(path.clone())
    }
}

fn digest_stem(repo: &RepoUrl) -> String {
    if let Some(provider) = &repo.provider {
        return provider.repo.clone();
    }
    repo.url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repository")
        .trim_end_matches(".git")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalized_output_has_both_headers_in_order() {
        let output = IngestOutput {
            tree: "└── main.go\n".to_string(),
            content: "File: main.go\npackage main\n".to_string(),
        };
        let digest = normalized(&output);
        let tree_at = digest.find(TREE_HEADER).expect("tree header");
        let content_at = digest.find(CONTENT_HEADER).expect("content header");
        assert!(tree_at < content_at);
        assert!(digest.contains(SECTION_SEPARATOR));
        assert!(digest.contains("└── main.go"));
        assert!(digest.contains("package main"));
    }

    #[test]
    fn digest_stem_prefers_the_provider_repo_name() {
        let repo = RepoUrl::parse("https://github.com/acme/widgets/tree/main").unwrap();
        assert_eq!(digest_stem(&repo), "widgets");

        let generic = RepoUrl::parse("https://git.sr.ht/~acme/toolkit.git").unwrap();
        assert_eq!(digest_stem(&generic), "toolkit");
    }
}
