//! Render a prompt template against JSON data and send it to OpenRouter.
//!
//! Reads the API key from the `OPENROUTER_KEY` environment variable.
//! `RUST_LOG` sets the log level (default `info`); logs go to stderr and the
//! response to stdout.
//!
//! # Examples
//!
//! ```sh
//! # Render and send
//! parley --template support.json --data ticket.json
//!
//! # Override fields and sampling
//! parley --template support.json --data ticket.json \
//!   --set question="Where is my order?" --temperature 0.2
//!
//! # Stream the reply as it is generated
//! parley --template support.json --data ticket.json --stream
//!
//! # Print the rendered prompt without calling the API
//! parley --template support.json --set question=hi --dry-run
//! ```

use clap::Parser;
use futures::StreamExt;
use parley::agent::prompt::{PromptData, TemplateFile};
use parley::agent::{Agent, AgentConfig, DEFAULT_AGENT_NAME};
use parley::api::OpenRouterClient;
use parley::model::{EchoModel, LanguageModel, ModelResponse};
use parley::{DEFAULT_MODEL, GenerateConfig};
use serde_json::Value;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Render a prompt template against JSON data and send it to OpenRouter.
///
/// Reads the API key from the OPENROUTER_KEY environment variable.
#[derive(Parser)]
#[command(name = "parley")]
struct Cli {
    // ── Prompt ─────────────────────────────────────────────────
    /// Path to a JSON template file
    #[arg(long)]
    template: PathBuf,

    /// Path to a JSON object holding the prompt data
    #[arg(long)]
    data: Option<PathBuf>,

    /// Set a data field; the value is parsed as JSON, falling back to a plain string
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    set: Vec<(String, Value)>,

    /// Role of the message carrying the rendered prompt
    #[arg(long, default_value = "system")]
    role: String,

    /// Agent name shown in the run log
    #[arg(long, default_value = DEFAULT_AGENT_NAME)]
    name: String,

    // ── Model selection ────────────────────────────────────────
    /// Model to use
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,

    // ── Sampling parameters ────────────────────────────────────
    /// Sampling temperature (0.0 – 1.0)
    #[arg(long, conflicts_with = "top_p")]
    temperature: Option<f32>,

    /// Nucleus sampling threshold (0.0 – 1.0)
    #[arg(long)]
    top_p: Option<f32>,

    /// Presence penalty (-2.0 – 2.0); defaults to $PRESENCE_PENALTY or 0.0
    #[arg(long, allow_hyphen_values = true)]
    presence_penalty: Option<f32>,

    // ── Output control ─────────────────────────────────────────
    /// Maximum tokens in the response (0 = provider default)
    #[arg(long, default_value_t = 0)]
    max_tokens: u32,

    /// Print the response as it streams in
    #[arg(long)]
    stream: bool,

    /// Render and validate, print the prompt, and skip the API call
    #[arg(long)]
    dry_run: bool,
}

// ── Helpers ────────────────────────────────────────────────────────

fn parse_key_value(arg: &str) -> Result<(String, Value), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{arg}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{arg}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn load_data(path: Option<&Path>) -> CliResult<PromptData> {
    let Some(path) = path else {
        return Ok(PromptData::new());
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read data file '{}': {e}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| format!("failed to parse data file '{}': {e}", path.display()))?;
    Ok(PromptData::from_value(value)?)
}

fn build_model(cli: &Cli) -> CliResult<Arc<dyn LanguageModel>> {
    if cli.dry_run {
        return Ok(Arc::new(EchoModel));
    }
    let api_key = std::env::var("OPENROUTER_KEY")
        .map_err(|_| "OPENROUTER_KEY environment variable is not set".to_string())?;
    let client = OpenRouterClient::new(api_key)?
        .with_model(cli.model.as_str())
        .with_max_tokens(cli.max_tokens);
    Ok(Arc::new(client))
}

async fn run(cli: &Cli) -> CliResult<()> {
    let template = TemplateFile::load(&cli.template)?;
    let mut data = load_data(cli.data.as_deref())?;
    data.update(cli.set.iter().cloned());

    let config = AgentConfig::new(cli.name.as_str())
        .with_role(cli.role.as_str())
        .with_streaming(cli.stream && !cli.dry_run)
        .with_env_generate()?;
    let overrides = GenerateConfig {
        temperature: cli.temperature,
        top_p: cli.top_p,
        presence_penalty: cli.presence_penalty,
    };

    let mut agent = Agent::from_config(build_model(cli)?, config)
        .with_data(data)
        .with_template(template.compile());

    let response = agent.run_with(&overrides).await?;

    if cli.dry_run {
        println!("{}", agent.prompt().unwrap_or_default());
        return Ok(());
    }

    match response {
        ModelResponse::Text(text) => println!("{text}"),
        ModelResponse::Stream(mut stream) => {
            let mut stdout = io::stdout().lock();
            while let Some(chunk) = stream.next().await {
                write!(stdout, "{}", chunk?)?;
                stdout.flush()?;
            }
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn set_values_parse_as_json_or_string() {
        assert_eq!(parse_key_value("n=3").unwrap(), ("n".into(), json!(3)));
        assert_eq!(parse_key_value("tags=[\"a\"]").unwrap(), ("tags".into(), json!(["a"])));
        assert_eq!(
            parse_key_value("q=Where is it?").unwrap(),
            ("q".into(), json!("Where is it?"))
        );
        assert_eq!(parse_key_value("eq=a=b").unwrap(), ("eq".into(), json!("a=b")));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn temperature_and_top_p_conflict() {
        let result = Cli::try_parse_from([
            "parley",
            "--template",
            "t.json",
            "--temperature",
            "0.5",
            "--top-p",
            "0.9",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_presence_penalty_accepted() {
        let cli = Cli::try_parse_from([
            "parley",
            "--template",
            "t.json",
            "--presence-penalty",
            "-1.5",
        ])
        .unwrap();
        assert_eq!(cli.presence_penalty, Some(-1.5));
        assert_eq!(cli.role, "system");
        assert_eq!(cli.model, DEFAULT_MODEL);
    }

    #[test]
    fn data_file_must_be_an_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2]").unwrap();
        assert!(load_data(Some(file.path())).is_err());
        assert!(load_data(None).unwrap().is_empty());
    }
}
