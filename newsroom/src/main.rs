mod driver;
mod pipeline;
mod tee;

use agent::tools::{Builtin, FetchPage, WebSearch};
use agent::{Result, SharedWriter};
use clap::Parser;
use std::path::PathBuf;

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama3-groq-70b-8192-tool-use-preview";

/// Research recent AI news and turn it into a blog post, a tweet, a reviewed
/// report and its Spanish translation.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// API key for the chat completions endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API key for Tavily web search
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_api_key: Option<String>,

    /// Model used by every agent
    #[arg(long, env = "NEWSROOM_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// OpenAI-compatible endpoint serving the model
    #[arg(long, env = "NEWSROOM_API_BASE", default_value = GROQ_API_BASE)]
    api_base: String,

    /// Directory the run log is written to
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Number of results each web search returns
    #[arg(long, default_value_t = 1)]
    search_results: usize,
}

/// A missing `.env` is fine, plain environment variables still apply; an
/// unreadable or malformed one is worth a warning.
fn dotenv_problem<T>(loaded: dotenvy::Result<T>) -> Option<dotenvy::Error> {
    loaded.err().filter(|err| !err.not_found())
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(err) = dotenv_problem(dotenv) {
        tracing::warn!(error = %err, "could not load .env");
    }

    if args.api_key.is_none() {
        tracing::warn!("GROQ_API_KEY is not set, model requests will be rejected");
    }

    let llm = agent::llm::OpenAI::new(
        args.model,
        &args.api_base,
        args.api_key.as_deref().unwrap_or_default(),
    );
    let tools = vec![
        Builtin::WebSearch(WebSearch::new(args.tavily_api_key, args.search_results)),
        Builtin::FetchPage(FetchPage::new()),
    ];

    let mut crew = pipeline::newsroom(llm, tools)?;

    driver::run(
        &SharedWriter::stdout(),
        &args.log_dir,
        &mut crew,
        chrono::Local::now(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::dotenv_problem;
    use std::io::Write;

    #[test]
    fn test_missing_dotenv_is_quiet() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let loaded = dotenvy::from_path(dir.path().join(".env"));

        assert!(dotenv_problem(loaded).is_none());
        Ok(())
    }

    #[test]
    fn test_malformed_dotenv_is_reported() -> std::io::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "NEWSROOM_TEST_KEY=\"never closed")?;

        let loaded = dotenvy::from_path(file.path());
        assert!(dotenv_problem(loaded).is_some());
        Ok(())
    }
}
