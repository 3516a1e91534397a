//! # Market News Digest
//!
//! Command-line front end over the library pipeline:
//!
//! 1. **Retrieval**: topic or market news from NewsAPI
//! 2. **Scraping**: readable text from each article URL
//! 3. **Analysis**: structured stock analysis from an LLM
//! 4. **Output**: JSON or Markdown on stdout, optionally written to disk
//!
//! ## Usage
//!
//! ```sh
//! market_news_digest digest "Reliance Industries" --markdown
//! ```
//!
//! Logs go to stderr so stdout stays machine-readable.

use chrono::Local;
use clap::Parser;
use market_news_digest::config::Settings;
use market_news_digest::error::ConfigError;
use market_news_digest::news::DEFAULT_TOPIC_PAGE_SIZE;
use market_news_digest::outputs::{json, markdown};
use market_news_digest::utils::ensure_writable_dir;
use market_news_digest::{
    ArticleScraper, ChatClient, NewsRetriever, PersonaSession, StockAnalysis, Summarizer,
};
use serde::Serialize;
use std::error::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref())?;

    // Early check: fail before any network work if the output dir is unusable
    if let Some(dir) = args.output_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    run(&args, &settings).await?;

    let elapsed = start_time.elapsed();
    info!(?elapsed, millis = elapsed.as_millis() as u64, "Execution complete");
    Ok(())
}

async fn run(args: &Cli, settings: &Settings) -> Result<(), Box<dyn Error>> {
    match &args.command {
        Command::News {
            topic,
            page_size,
            markdown,
        } => {
            let articles = news_retriever(args, settings)?.query(topic, *page_size).await;
            if *markdown {
                println!("{}", markdown::articles_to_markdown(topic, &articles));
            } else {
                print_json(&articles)?;
            }
        }
        Command::Today {
            page_size,
            markdown,
        } => {
            let articles = news_retriever(args, settings)?
                .todays_market_news(*page_size)
                .await;
            if *markdown {
                println!("{}", markdown::articles_to_markdown("Today's Market News", &articles));
            } else {
                print_json(&articles)?;
            }
        }
        Command::Scrape { url } => {
            let body = ArticleScraper::from_settings(settings)?.scrape_article(url).await?;
            println!("{body}");
        }
        Command::Analyze {
            label,
            urls,
            markdown,
        } => {
            let analysis = summarizer(args, settings)?
                .summarize_structured(label, urls)
                .await;
            emit_analysis(&analysis, *markdown, args.output_dir.as_deref()).await?;
        }
        Command::Summarize { label, urls } => {
            let summary = summarizer(args, settings)?.summarize_plain(label, urls).await;
            println!("{summary}");
        }
        Command::Digest { topic, markdown } => {
            let analysis = digest(args, settings, topic).await?;
            emit_analysis(&analysis, *markdown, args.output_dir.as_deref()).await?;
        }
        Command::Ask { questions } => {
            ask(args, settings, questions).await?;
        }
    }
    Ok(())
}

fn news_retriever(args: &Cli, settings: &Settings) -> Result<NewsRetriever, ConfigError> {
    NewsRetriever::from_settings(args.news_api_key.clone().unwrap_or_default(), settings)
}

fn summarizer(args: &Cli, settings: &Settings) -> Result<Summarizer<ChatClient>, ConfigError> {
    let model = ChatClient::from_settings(args.llm_api_key.clone().unwrap_or_default(), settings)?;
    let scraper = ArticleScraper::from_settings(settings)?;
    info!(model = %model.model(), "Chat client ready");
    Ok(Summarizer::new(model, scraper, settings.min_corpus_chars))
}

/// News about `topic`, then an analysis of the linked articles labelled with `topic`.
#[instrument(level = "info", skip(args, settings))]
async fn digest(args: &Cli, settings: &Settings, topic: &str) -> Result<StockAnalysis, ConfigError> {
    // Build both clients up front so a missing credential fails before any request.
    let retriever = news_retriever(args, settings)?;
    let summarizer = summarizer(args, settings)?;

    let articles = retriever.query(topic, DEFAULT_TOPIC_PAGE_SIZE).await;
    let urls: Vec<String> = articles
        .into_iter()
        .map(|a| a.url)
        .filter(|u| !u.trim().is_empty())
        .collect();
    if urls.is_empty() {
        warn!(%topic, "No article URLs found for topic");
    }
    info!(url_count = urls.len(), "Analyzing topic articles");

    Ok(summarizer.summarize_structured(topic, &urls).await)
}

async fn ask(args: &Cli, settings: &Settings, questions: &[String]) -> Result<(), Box<dyn Error>> {
    let summarizer = summarizer(args, settings)?;
    let mut session = PersonaSession::new();

    if !questions.is_empty() {
        for question in questions {
            let answer = summarizer.ask_persona(&mut session, question).await;
            print_json(&answer)?;
        }
        return Ok(());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        let answer = summarizer.ask_persona(&mut session, question).await;
        print_json(&answer)?;
    }
    info!(turns = session.turns(), "Persona session ended");
    Ok(())
}

async fn emit_analysis(
    analysis: &StockAnalysis,
    as_markdown: bool,
    output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let md = markdown::analysis_to_markdown(analysis);
    if as_markdown {
        println!("{md}");
    } else {
        print_json(analysis)?;
    }

    let Some(dir) = output_dir else {
        return Ok(());
    };

    let local_date = Local::now().date_naive().to_string();
    if let Err(e) = json::write_analysis(analysis, dir, &local_date).await {
        error!(error = %e, "Failed to write analysis JSON");
    }

    let md_path = json::analysis_path(dir, &local_date, analysis, "md");
    info!(path = %md_path.display(), "Writing Markdown");
    if let Err(e) = tokio::fs::write(&md_path, md).await {
        error!(path = %md_path.display(), error = %e, "Failed writing Markdown");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
