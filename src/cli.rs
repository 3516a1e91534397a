//! Command-line interface definitions for Market News Digest.
//!
//! Credentials can be passed as flags or picked up from the environment
//! (including a `.env` file in the working directory).

use clap::{Parser, Subcommand};
use market_news_digest::news::{DEFAULT_TODAY_PAGE_SIZE, DEFAULT_TOPIC_PAGE_SIZE};

/// Command-line arguments for the Market News Digest application.
///
/// # Examples
///
/// ```sh
/// # Relevant news about a company
/// market_news_digest news "Tata Motors"
///
/// # Analyze two article URLs and write the result under ./out
/// market_news_digest --output-dir ./out analyze TCS https://a.example/1 https://b.example/2
///
/// # Ask the persona a few questions in one conversation
/// market_news_digest ask "What is an ETF?" "Should I start with index funds?"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true, global = true)]
    pub news_api_key: Option<String>,

    /// API key for the chat completions provider
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub llm_api_key: Option<String>,

    /// Also write analyses as JSON and Markdown under this directory
    #[arg(short, long, global = true)]
    pub output_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Most relevant news about a company or topic
    News {
        topic: String,
        #[arg(long, default_value_t = DEFAULT_TOPIC_PAGE_SIZE)]
        page_size: u32,
        /// Print Markdown instead of JSON
        #[arg(long)]
        markdown: bool,
    },
    /// Today's general market news
    Today {
        #[arg(long, default_value_t = DEFAULT_TODAY_PAGE_SIZE)]
        page_size: u32,
        #[arg(long)]
        markdown: bool,
    },
    /// Print the extracted text of one article
    Scrape { url: String },
    /// Structured analysis of the articles at the given URLs
    Analyze {
        label: String,
        #[arg(required = true)]
        urls: Vec<String>,
        #[arg(long)]
        markdown: bool,
    },
    /// Plain-text summary of the articles at the given URLs
    Summarize {
        label: String,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Find news about a topic and analyze it
    Digest {
        topic: String,
        #[arg(long)]
        markdown: bool,
    },
    /// Ask the investing persona; reads questions from stdin when none are given
    Ask { questions: Vec<String> },
}
