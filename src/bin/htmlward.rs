//! CLI front end: load a JSON policy document and an HTML file, sanitize,
//! and print the result to stdout (or write it to `--output`).
//!
//! Grounded on `src/bin/minimize.rs`'s clap-derived `Args` plus
//! `anyhow::Context`-chained file I/O; `--verbose` wires up `logger::init`
//! the same way the teacher's binaries reach for `log`/`anyhow` together.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// HTML fragment to sanitize. Reads stdin if omitted.
    #[arg(name = "HTML_FILE")]
    html_file: Option<PathBuf>,

    /// JSON policy document (spec §6's wire `Policy` shape).
    #[arg(long, short)]
    policy: PathBuf,

    /// write the sanitized fragment here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// enable info-level logging of recovered violations
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        htmlward::logger::init().context("failed to install logger")?;
    }

    let policy_src = std::fs::read_to_string(&args.policy)
        .with_context(|| format!("reading policy file {}", args.policy.display()))?;
    let policy: htmlward::Policy = serde_json::from_str(&policy_src)
        .with_context(|| format!("parsing policy file {}", args.policy.display()))?;

    let html = match &args.html_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading HTML file {}", path.display()))?,
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading HTML from stdin")?;
            buf
        }
    };

    let sanitized = htmlward::sanitize(&html, &policy)
        .map_err(|err| anyhow::anyhow!("{err}"))
        .context("sanitization failed")?;

    match args.output {
        Some(path) => std::fs::write(&path, sanitized)
            .with_context(|| format!("writing output to {}", path.display()))?,
        None => println!("{sanitized}"),
    }

    Ok(())
}
