//! wikiscribe - generate an encyclopedic article from Wikipedia research.
//!
//! ```text
//! wikiscribe "Inteligência artificial"
//! wikiscribe "Rust (programming language)" --language en --min-words 600 -o rust.json
//! wikiscribe "Lisboa" --llm gemini --hierarchical
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikiscribe_agents::{ArticleCrew, CrewOutput, Process};
use wikiscribe_common::{
    Article, ArticleBrief,
    article::MIN_SECTIONS,
    task::{DEFAULT_LANGUAGE, DEFAULT_MIN_WORDS},
};
use wikiscribe_llm::{DEFAULT_LLM_ENV, LlmConfig, LlmProvider, build_llm_client};
use wikiscribe_wiki::WikipediaClient;

/// Wikipedia article generator
#[derive(Parser, Debug)]
#[command(name = "wikiscribe", version, about)]
struct Cli {
    /// Topic of the article
    topic: String,

    /// Minimum number of words
    #[arg(long, default_value_t = DEFAULT_MIN_WORDS)]
    min_words: usize,

    /// Desired number of sections
    #[arg(long, value_parser = parse_sections)]
    sections: Option<usize>,

    /// Wikipedia language code
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    language: String,

    /// LLM provider
    #[arg(
        long,
        env = DEFAULT_LLM_ENV,
        default_value = "groq",
        ignore_case = true,
        value_parser = PossibleValuesParser::new(["groq", "gemini"]).map(|s| s.to_lowercase())
    )]
    llm: String,

    /// Show detailed logs
    #[arg(long)]
    verbose: bool,

    /// Write the full article as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Use the manager-supervised process instead of the sequential one
    #[arg(long)]
    hierarchical: bool,

    /// LLM configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn brief(&self) -> ArticleBrief {
        ArticleBrief::new(self.topic.trim())
            .with_min_words(self.min_words)
            .with_sections(self.sections)
            .with_language(self.language.trim().to_lowercase())
    }
}

fn parse_sections(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if count < MIN_SECTIONS {
        return Err(format!("an article needs at least {MIN_SECTIONS} sections"));
    }
    Ok(count)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "debug,hyper=info,reqwest=info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let provider: LlmProvider = cli.llm.parse()?;
    let process = Process::from_flag(cli.hierarchical);
    let brief = cli.brief();
    anyhow::ensure!(!brief.topic.is_empty(), "topic must not be empty");
    anyhow::ensure!(brief.min_words > 0, "--min-words must be greater than zero");

    let config = match &cli.config {
        Some(path) => LlmConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LlmConfig::default(),
    };

    println!("Generating an article about '{}'...", brief.topic);
    println!(
        "Settings: LLM={provider}, language={}, min words={}, process={process}",
        brief.language, brief.min_words
    );

    let llm = build_llm_client(&config, provider)?;
    let wikipedia = WikipediaClient::with_timeout(Duration::from_secs(config.timeout_secs))?;

    let output = ArticleCrew::new(llm, Arc::new(wikipedia))
        .with_process(process)
        .run(&brief)
        .await?;

    info!(word_count = output.article.word_count, "Article ready");

    if let Some(path) = &cli.output {
        save_article(&output.article, path)?;
    }
    print!("{}", report(&output, cli.output.as_deref()));

    Ok(())
}

fn save_article(article: &Article, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(article)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// Human-readable summary of a finished run.
fn report(output: &CrewOutput, saved_to: Option<&Path>) -> String {
    let article = &output.article;
    let mut out = String::new();

    let _ = writeln!(out, "\nArticle generated successfully!");
    let _ = writeln!(out, "Title: {}", article.title);
    let _ = writeln!(out, "Processing time: {} seconds", output.processing_time_secs);
    let _ = writeln!(out, "Word count: {}", article.word_count);
    let _ = writeln!(out, "Keywords: {}", article.metadata.keywords.join(", "));

    match saved_to {
        Some(path) => {
            let _ = writeln!(out, "\nArticle saved to: {}", path.display());
        }
        None => {
            let _ = writeln!(out, "\nSummary:\n{}", article.summary);
            let _ = writeln!(out, "\nUse --output to save the full article to a file");
        }
    }

    out
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\nError: {e:#}");
            ExitCode::FAILURE
        }
    }
}
