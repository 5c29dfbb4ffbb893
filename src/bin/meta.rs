//! Minimal CLI surface (§6): `meta index <config>` builds (or reloads) an
//! index from a `config.toml`; `meta query <config> [--interactive]` runs
//! ranked retrieval against it.
//!
//! Built on `clap::Parser`/`Subcommand`; exit codes (0 success, 1
//! configuration error, 2 I/O error) distinguish a bad `config.toml` from a
//! failed read/write so calling scripts can branch on which happened.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use meta_index::config::Config;
use meta_index::corpus::DocContent;
use meta_index::error::MetaError;
use meta_index::index::{DiskIndex, ForwardIndex, InvertedIndex};
use meta_index::ranker::{self, Query, Ranker};
use meta_index::types::ClassLabel;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or reload, if already present) the index named by a config.
    Index { config: PathBuf },
    /// Run ranked retrieval against an already-built index.
    Query {
        config: PathBuf,
        #[arg(long)]
        interactive: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Index { config } => run_index(&config),
        Commands::Query { config, interactive } => run_query(&config, interactive),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(err @ MetaError::Config(_)) => {
            eprintln!("{err}");
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

fn run_index(config_path: &PathBuf) -> Result<(), MetaError> {
    let config = Config::load(config_path)?;
    let analyzer = config.build_analyzer()?;
    let corpus = config.open_corpus()?;
    let idx = InvertedIndex::open_or_build(
        config.inverted_index_prefix(),
        config.inverted_index.clone().unwrap_or_else(|| "inverted-index".to_owned()),
        config.metadata_schema(),
        analyzer,
        || Ok(corpus),
        None,
        None,
    )?;
    println!("indexed {} documents at {}", idx.num_docs(), idx.prefix().display());
    Ok(())
}

fn run_query(config_path: &PathBuf, interactive: bool) -> Result<(), MetaError> {
    let config = Config::load(config_path)?;
    let analyzer = config.build_analyzer()?;
    let idx = InvertedIndex::open_or_build(
        config.inverted_index_prefix(),
        config.inverted_index.clone().unwrap_or_else(|| "inverted-index".to_owned()),
        config.metadata_schema(),
        analyzer,
        || config.open_corpus(),
        None,
        None,
    )?;
    let ranker = config.build_ranker()?;
    let fwd = if matches!(ranker, Ranker::Rocchio { .. }) {
        Some(ForwardIndex::open_or_build(
            config.forward_index_prefix(),
            config.forward_index.clone().unwrap_or_else(|| "forward-index".to_owned()),
            &idx,
            config.metadata_schema(),
            None,
            None,
        )?)
    } else {
        None
    };

    if interactive {
        run_interactive(&idx, fwd.as_ref(), &ranker)
    } else {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        if let Some(line) = lines.next() {
            run_one_query(&idx, fwd.as_ref(), &ranker, &line?)?;
        }
        Ok(())
    }
}

fn run_interactive(idx: &InvertedIndex, fwd: Option<&ForwardIndex>, ranker: &Ranker) -> Result<(), MetaError> {
    let stdin = io::stdin();
    loop {
        print!("query> ");
        io::stdout().flush()?;
        let mut line = String::new();
        let bytes = stdin.lock().read_line(&mut line)?;
        if bytes == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        run_one_query(idx, fwd, ranker, line)?;
    }
    Ok(())
}

fn run_one_query(idx: &InvertedIndex, fwd: Option<&ForwardIndex>, ranker: &Ranker, text: &str) -> Result<(), MetaError> {
    let query = parse_query(idx, text)?;
    let results = ranker::search(idx, fwd, ranker, &query, 10, |_| true)?;
    for (rank, (d_id, score)) in results.iter().enumerate() {
        println!("{:>3}. {:<40} {:.6}", rank + 1, idx.doc_name(*d_id), score);
    }
    if results.is_empty() {
        println!("(no results)");
    }
    Ok(())
}

/// Tokenizes `text` with the index's own analyzer and looks each resulting
/// term up in the vocabulary; terms absent from the vocabulary are simply
/// not included in the returned query, matching §4.9's boundary rule.
fn parse_query(idx: &InvertedIndex, text: &str) -> Result<Query, MetaError> {
    use meta_index::corpus::Document;
    use meta_index::types::DocId;

    let doc = Document::new(DocId::new(0), Some(ClassLabel::from("[none]")), "utf-8")
        .with_content(DocContent::Inline(text.to_owned()));
    let counts = idx.tokenize(&doc)?;

    let mut query = Query::new();
    for (term, count) in counts {
        if let Some(t_id) = idx.get_term_id(&term) {
            query.insert(t_id, count as f64);
        }
    }
    Ok(query)
}
