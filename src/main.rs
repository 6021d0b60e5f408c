// src/main.rs
use anyhow::Result;
use clap::Parser;
use edinetscraper::{
    analysis::{analyze_documents, render_report, AnalysisFramework, OpenAiResolver, DEFAULT_TOOLS},
    config::Config,
    fetch::{download_documents, DateRangeScanner, DocumentMetadata, EdinetClient, ScanFilters},
    process::{process_zip_directory, ProcessorRegistry, StructuredDocumentData},
};
use std::{collections::HashMap, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Find the latest EDINET filings, normalise their CSV exports and summarise them with an LLM"
)]
struct Args {
    /// Days to look back from today for a day with filings.
    #[arg(long)]
    days_back: Option<u32>,

    /// Document type codes to scan for.
    #[arg(long, value_delimiter = ',', default_value = "160,180")]
    doc_types: Vec<String>,

    #[arg(long, default_value = "downloads")]
    download_dir: PathBuf,

    /// YAML file overriding the environment-derived config.
    #[arg(long, env = "EDINET_SCRAPER_CONFIG")]
    config: Option<PathBuf>,

    /// Upper bound on documents sent for analysis.
    #[arg(long)]
    max_documents: Option<usize>,

    /// Stop after normalisation.
    #[arg(long)]
    skip_analysis: bool,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())?;
    let days_back = args.days_back.unwrap_or(cfg.limits.days_back);
    let max_documents = args.max_documents.unwrap_or(cfg.limits.max_documents);

    // ─── 2) find the most recent day with filings ────────────────────
    let client = EdinetClient::new(&cfg.edinet_base_url, cfg.edinet_api_key.clone())?;
    let scanner = DateRangeScanner::new(&client);
    let (docs, found_date) = scanner.scan(&args.doc_types, days_back, &ScanFilters::default());
    let Some(found_date) = found_date else {
        info!("no documents found; exit");
        return Ok(());
    };
    info!(%found_date, count = docs.len(), "documents to download");

    // ─── 3) download & normalise ─────────────────────────────────────
    download_documents(&client, &docs, &args.download_dir)?;
    let registry = ProcessorRegistry::default();
    let structured = process_zip_directory(&registry, &args.download_dir, Some(args.doc_types.as_slice()));
    let data_by_id: HashMap<String, StructuredDocumentData> = structured
        .into_iter()
        .map(|d| (d.doc_id.clone(), d))
        .collect();

    // only documents that actually normalised go forward
    let to_analyze: Vec<DocumentMetadata> = docs
        .into_iter()
        .filter(|d| data_by_id.contains_key(&d.doc_id))
        .take(max_documents)
        .collect();
    if to_analyze.is_empty() {
        warn!("no documents produced structured data; exit");
        return Ok(());
    }
    info!(count = to_analyze.len(), "documents ready for analysis");

    if args.skip_analysis {
        for doc in &to_analyze {
            let name = data_by_id[&doc.doc_id].display_company_name();
            println!("{}  {}", doc.doc_id, name);
        }
        return Ok(());
    }

    // ─── 4) analyse & report ─────────────────────────────────────────
    let resolver = OpenAiResolver::new(&cfg.llm_base_url, cfg.llm_api_key.clone())?;
    let framework = AnalysisFramework::new(&resolver, &cfg);
    let results = analyze_documents(&framework, &to_analyze, &data_by_id, &DEFAULT_TOOLS);
    print!("{}", render_report(&results)?);

    info!("done");
    Ok(())
}
