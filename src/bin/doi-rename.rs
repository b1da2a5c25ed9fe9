//! CLI binary for pdf-doi-rename.
//!
//! `serve` runs the HTTP upload service; `rename` applies the same
//! pipeline to a local file and writes a copy under the derived name.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdf_doi_rename::{server, DoiRenamer, RenameConfig, RenameService};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve uploads on localhost:8080
  doi-rename serve

  # Accept uploads from other hosts
  doi-rename serve --bind 0.0.0.0:8080

  # Upload a PDF to a running service
  curl -OJ -F "file=@paper.pdf;type=application/pdf" http://127.0.0.1:8080/

  # Copy a local PDF to its derived name (same directory)
  doi-rename rename paper.pdf

  # Only print the name, or the full record as JSON
  doi-rename rename --dry-run paper.pdf
  doi-rename rename --json --output-dir library/ paper.pdf

ENVIRONMENT VARIABLES:
  DOI_RENAME_BIND           Listen address for `serve`
  DOI_RENAME_CONTACT_EMAIL  mailto: sent to the registries (Crossref polite pool)
  RUST_LOG                  Overrides the log filter (e.g. pdf_doi_rename=debug)
"#;

/// Rename scholarly PDFs from the DOI printed on their first pages.
#[derive(Parser, Debug)]
#[command(
    name = "doi-rename",
    version,
    about = "Rename scholarly PDFs from the DOI printed on their first pages",
    long_about = "Finds the DOI on the first pages of a PDF, looks up journal, year, first \
author and title on Crossref (falling back to OpenAlex), and derives a filename of the form \
journal_year_author_title_doi.pdf. Runs as an HTTP upload service or on local files.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    opts: GlobalOpts,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST multipart/form-data` uploads over HTTP.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOI_RENAME_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },

    /// Copy a local PDF to its DOI-derived filename.
    Rename {
        /// PDF file to rename.
        file: PathBuf,

        /// Directory for the renamed copy (default: next to the input).
        #[arg(short, long, env = "DOI_RENAME_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Print the derived name without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Print the resolved record as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Pages scanned for a DOI.
    #[arg(long, global = true, env = "DOI_RENAME_MAX_PAGES", default_value_t = 2,
          value_parser = clap::value_parser!(u32).range(1..=50))]
    max_pages: u32,

    /// Largest accepted PDF in MiB.
    #[arg(long, global = true, env = "DOI_RENAME_MAX_FILE_MB", default_value_t = 20)]
    max_file_mb: usize,

    /// Resolved DOIs kept in memory.
    #[arg(long, global = true, env = "DOI_RENAME_CACHE_CAPACITY", default_value_t = 256)]
    cache_capacity: usize,

    /// Per registry call timeout in seconds.
    #[arg(long, global = true, env = "DOI_RENAME_TIMEOUT", default_value_t = 15)]
    timeout: u64,

    /// Retries per registry call on 5xx or network failure.
    #[arg(long, global = true, env = "DOI_RENAME_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Contact address appended to the User-Agent.
    #[arg(long, global = true, env = "DOI_RENAME_CONTACT_EMAIL")]
    contact_email: Option<String>,

    /// Crossref API base URL.
    #[arg(long, global = true, env = "DOI_RENAME_CROSSREF_URL")]
    crossref_url: Option<String>,

    /// OpenAlex API base URL.
    #[arg(long, global = true, env = "DOI_RENAME_OPENALEX_URL")]
    openalex_url: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOI_RENAME_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOI_RENAME_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.opts.verbose {
        "debug"
    } else if cli.opts.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.opts)?;

    match cli.command {
        Command::Serve { bind } => {
            let service = RenameService::new(config).context("Failed to start service")?;
            server::serve(bind, service)
                .await
                .context("HTTP server failed")?;
        }
        Command::Rename {
            file,
            output_dir,
            dry_run,
            json,
        } => {
            let renamer = DoiRenamer::new(config).context("Failed to initialise renamer")?;
            rename_file(&renamer, &file, output_dir.as_deref(), dry_run, json).await?;
        }
    }

    Ok(())
}

/// Map CLI args to `RenameConfig`.
fn build_config(opts: &GlobalOpts) -> Result<RenameConfig> {
    let mut builder = RenameConfig::builder()
        .max_pages(opts.max_pages as usize)
        .max_file_size(opts.max_file_mb.saturating_mul(pdf_doi_rename::config::MIB))
        .cache_capacity(opts.cache_capacity)
        .request_timeout_secs(opts.timeout)
        .max_retries(opts.max_retries);

    if let Some(ref mail) = opts.contact_email {
        builder = builder.contact_email(mail.clone());
    }
    if let Some(ref url) = opts.crossref_url {
        builder = builder.crossref_base_url(url.clone());
    }
    if let Some(ref url) = opts.openalex_url {
        builder = builder.openalex_base_url(url.clone());
    }

    builder.build().context("Invalid configuration")
}

async fn rename_file(
    renamer: &DoiRenamer,
    file: &Path,
    output_dir: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let renamed = renamer
        .rename(bytes)
        .await
        .with_context(|| format!("Cannot rename {}", file.display()))?;

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let target = dir.join(&renamed.filename);

    if !dry_run {
        write_atomic(&dir, &target, &renamed.bytes)?;
        info!("Wrote {}", target.display());
    }

    if json {
        let mut value =
            serde_json::to_value(&renamed).context("Failed to serialise rename result")?;
        value["path"] = serde_json::Value::String(target.display().to_string());
        value["written"] = serde_json::Value::Bool(!dry_run);
        println!(
            "{}",
            serde_json::to_string_pretty(&value).context("Failed to serialise rename result")?
        );
    } else if dry_run {
        println!("{}", renamed.filename);
    } else {
        println!("{}", target.display());
    }
    Ok(())
}

/// Write through a temp file in `dir` so a crash never leaves a partial PDF.
fn write_atomic(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("Failed to write PDF")?;
    tmp.persist(target)
        .with_context(|| format!("Failed to move PDF to {}", target.display()))?;
    Ok(())
}
