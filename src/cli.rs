//! Command-line front end: argument parsing and the three run modes.

use std::env;
use std::future::Future;
use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::client::StraicoClient;
use crate::config::{
    API_KEY_ENV, BASE_URL_ENV, ClientConfig, build_client_from_config, resolve_api_key,
};
use crate::error::StraicoError;
use crate::format::{format_catalog, format_error, format_response};
use crate::http::DynHttpTransport;
use crate::types::{ApiVersion, ChatRequest, ModelCatalog, PricingMethod};

const EXAMPLES: &str = r#"Examples:
  # Use smart LLM selector with default pricing (balance)
  straico "What is the capital of France?"

  # Use quality pricing method for best results
  straico --pricing quality "Explain quantum computing"

  # Specify a specific model (bypasses smart selector)
  straico --model "openai/gpt-4o" "Tell me a joke"

  # Query multiple models simultaneously (v1 API)
  straico --models openai/gpt-4o-mini,anthropic/claude-3-5-haiku-20241022 "What is AI?"

  # Use smart selector to pick multiple models (v1 API)
  straico --pricing budget --quantity 2 "Compare different perspectives"

  # Interactive mode with balance pricing
  straico --interactive --pricing balance

  # Set API key via environment variable
  export STRAICO_API_KEY="your-api-key-here"
  straico "Your prompt here""#;

const QUIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

#[derive(Debug, Parser)]
#[command(name = "straico")]
#[command(version)]
#[command(about = "Straico CLI - Chat with AI using smart LLM selection")]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// The prompt/question to send to the AI
    pub prompt: Option<String>,

    /// Pricing tier for the smart LLM selector
    #[arg(short, long, value_enum, default_value_t = PricingMethod::Balance)]
    pub pricing: PricingMethod,

    /// Specific model to use (overrides smart LLM selector)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Multiple models to query simultaneously (v1 API only), comma separated or repeated
    #[arg(long, value_delimiter = ',')]
    pub models: Option<Vec<String>>,

    /// Number of models the smart LLM selector picks (1-4, v1 API only)
    #[arg(short, long)]
    pub quantity: Option<u32>,

    /// Run in interactive mode
    #[arg(short, long)]
    pub interactive: bool,

    /// List available models and exit
    #[arg(short, long)]
    pub list_models: bool,

    /// Straico API key (can also use STRAICO_API_KEY env var)
    #[arg(long)]
    pub api_key: Option<String>,

    /// API version used for chat requests
    #[arg(long, value_enum, default_value_t = ApiVersion::V1)]
    pub api_version: ApiVersion,

    /// Override the API host
    #[arg(long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// Hide loading animation
    #[arg(long)]
    pub no_animation: bool,

    /// Print only the response text, without price, words or justification
    #[arg(long)]
    pub response_only: bool,

    /// Show verbose output including request details
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ListModels,
    Interactive,
    Single(String),
}

impl Cli {
    /// Selects the run mode, or `None` when there is nothing to do.
    pub fn mode(&self) -> Option<Mode> {
        if self.list_models {
            Some(Mode::ListModels)
        } else if self.interactive {
            Some(Mode::Interactive)
        } else {
            self.prompt.clone().map(Mode::Single)
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            pricing: self.pricing,
            model: self.model.clone(),
            models: self.models.clone(),
            quantity: self.quantity,
            show_animation: !self.no_animation,
            response_only: self.response_only,
            verbose: self.verbose,
        }
    }

    /// Resolves the credential and builds a client for the chosen host and version.
    ///
    /// # Errors
    ///
    /// Returns [`StraicoError::Config`] when no credential is available.
    pub fn build_client(
        &self,
        transport: DynHttpTransport,
    ) -> Result<StraicoClient, StraicoError> {
        let api_key = resolve_api_key(self.api_key.clone(), env::var(API_KEY_ENV).ok())?;
        let config = ClientConfig {
            api_key,
            api_version: self.api_version,
            base_url: self.base_url.clone(),
        };
        build_client_from_config(&config, transport)
    }
}

/// Per-session request settings shared by every prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub pricing: PricingMethod,
    pub model: Option<String>,
    pub models: Option<Vec<String>>,
    pub quantity: Option<u32>,
    pub show_animation: bool,
    pub response_only: bool,
    pub verbose: bool,
}

impl SessionOptions {
    pub fn request_for(&self, prompt: impl Into<String>) -> ChatRequest {
        ChatRequest {
            message: prompt.into(),
            pricing_method: self.pricing,
            model: self.model.clone(),
            models: self.models.clone(),
            quantity: self.quantity,
            show_animation: self.show_animation,
        }
    }

    /// One-line description of how prompts will be routed.
    pub fn routing_note(&self) -> String {
        match (&self.model, &self.models, self.quantity) {
            (_, Some(models), _) => format!("[Querying multiple models: {}]", models.join(", ")),
            (Some(model), None, _) => format!("[Using model: {model}]"),
            (None, None, Some(quantity)) => format!(
                "[Using smart LLM selector with pricing: {}, quantity: {quantity}]",
                self.pricing
            ),
            (None, None, None) => {
                format!("[Using smart LLM selector with pricing: {}]", self.pricing)
            }
        }
    }
}

/// One prompt and the answer it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub prompt: String,
    pub reply: String,
}

/// Runs the selected mode to completion.
///
/// `interrupt` resolves when the user asks to stop (Ctrl-C in the binary). Interactive
/// mode treats it as a normal end of session; single-prompt mode reports
/// [`StraicoError::Interrupted`].
pub async fn run<R, W, F>(
    mode: Mode,
    client: &StraicoClient,
    options: &SessionOptions,
    input: R,
    out: &mut W,
    interrupt: F,
) -> Result<(), StraicoError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    debug!(?mode, api_version = %client.api_version(), "starting");
    match mode {
        Mode::ListModels => run_list_models(client, options, out).await,
        Mode::Interactive => run_interactive(client, options, input, out, interrupt).await,
        Mode::Single(prompt) => {
            tokio::select! {
                biased;
                () = interrupt => Err(StraicoError::Interrupted),
                result = run_single(client, options, &prompt, out) => result,
            }
        }
    }
}

/// Sends one prompt and prints the formatted answer.
///
/// # Errors
///
/// Forwards any client failure; the caller decides how to report it.
pub async fn run_single<W: Write>(
    client: &StraicoClient,
    options: &SessionOptions,
    prompt: &str,
    out: &mut W,
) -> Result<(), StraicoError> {
    if options.verbose {
        writeln!(out, "{}", options.routing_note())?;
    }
    let response = client.chat(&options.request_for(prompt)).await?;
    writeln!(out, "{}", format_response(&response, options.response_only)?)?;
    Ok(())
}

/// Fetches and prints the model catalog.
pub async fn run_list_models<W: Write>(
    client: &StraicoClient,
    options: &SessionOptions,
    out: &mut W,
) -> Result<(), StraicoError> {
    writeln!(out, "Fetching available models from Straico...")?;
    let catalog = client
        .get_models_with_animation(options.show_animation)
        .await?;
    write!(out, "{}", format_catalog(&catalog))?;
    Ok(())
}

/// Reads prompts line by line until a quit word, end of input, or `interrupt`.
///
/// Every line is an independent request. Failures are printed and the loop moves on.
/// `/models` lists the catalog (fetched once per session) and `/history` replays the
/// exchanges so far.
pub async fn run_interactive<R, W, F>(
    client: &StraicoClient,
    options: &SessionOptions,
    input: R,
    out: &mut W,
    interrupt: F,
) -> Result<(), StraicoError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    F: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let mut lines = input.lines();
    let mut transcript: Vec<Exchange> = Vec::new();
    let mut catalog: Option<ModelCatalog> = None;

    write_banner(options, out)?;

    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let line = tokio::select! {
            biased;
            () = &mut interrupt => {
                writeln!(out, "\n\nGoodbye!")?;
                return Ok(());
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            writeln!(out, "\nGoodbye!")?;
            return Ok(());
        };

        let prompt = line.trim();
        if QUIT_WORDS.iter().any(|word| prompt.eq_ignore_ascii_case(word)) {
            writeln!(out, "Goodbye!")?;
            return Ok(());
        }
        if prompt.is_empty() {
            continue;
        }

        match prompt {
            "/models" => {
                if catalog.is_none() {
                    let fetched = tokio::select! {
                        biased;
                        () = &mut interrupt => {
                            writeln!(out, "\n\nGoodbye!")?;
                            return Ok(());
                        }
                        fetched = client.get_models_with_animation(options.show_animation) => {
                            fetched
                        }
                    };
                    match fetched {
                        Ok(fetched) => catalog = Some(fetched),
                        Err(err) => {
                            writeln!(out, "{}", format_error(&err, options.verbose))?;
                            continue;
                        }
                    }
                }
                if let Some(catalog) = &catalog {
                    write!(out, "{}", format_catalog(catalog))?;
                }
                continue;
            }
            "/history" => {
                write_history(&transcript, out)?;
                continue;
            }
            _ => {}
        }

        if options.verbose {
            writeln!(out, "\n{}", options.routing_note())?;
        }
        let request = options.request_for(prompt);
        let result = tokio::select! {
            biased;
            () = &mut interrupt => {
                writeln!(out, "\n\nGoodbye!")?;
                return Ok(());
            }
            result = client.chat(&request) => result,
        };

        let formatted = result.and_then(|response| {
            let reply = response.text()?.unwrap_or_default();
            let rendered = format_response(&response, options.response_only)?;
            Ok((reply, rendered))
        });
        match formatted {
            Ok((reply, rendered)) => {
                writeln!(out, "{rendered}")?;
                transcript.push(Exchange {
                    prompt: prompt.to_string(),
                    reply,
                });
            }
            Err(err) => writeln!(out, "{}", format_error(&err, options.verbose))?,
        }
    }
}

fn write_banner<W: Write>(options: &SessionOptions, out: &mut W) -> Result<(), StraicoError> {
    writeln!(out, "🤖 Straico CLI - Interactive Mode")?;
    match (&options.model, &options.models) {
        (_, Some(models)) => writeln!(out, "Models: {}", models.join(", "))?,
        (Some(model), None) => writeln!(out, "Model: {model}")?,
        (None, None) => {
            writeln!(out, "Smart LLM Selector: Enabled")?;
            writeln!(out, "Pricing Method: {}", options.pricing)?;
        }
    }
    writeln!(out, "Type 'exit' or 'quit' to end the session")?;
    writeln!(out, "Commands: /models lists available models, /history shows this session\n")?;
    Ok(())
}

fn write_history<W: Write>(transcript: &[Exchange], out: &mut W) -> Result<(), StraicoError> {
    if transcript.is_empty() {
        writeln!(out, "No exchanges yet.")?;
        return Ok(());
    }
    for (idx, exchange) in transcript.iter().enumerate() {
        writeln!(out, "[{}] You: {}", idx + 1, exchange.prompt)?;
        writeln!(out, "    AI: {}\n", exchange.reply)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::http::{HttpRequest, HttpResponse, HttpTransport};

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<(u16, String)>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: &[(u16, &str)]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .iter()
                        .map(|(status, body)| (*status, body.to_string()))
                        .collect(),
                ),
                requests: Mutex::default(),
            })
        }

        fn request_count(&self) -> usize {
            self.requests.lock().expect("lock").len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, StraicoError> {
            self.requests.lock().expect("lock").push(request);
            let (status, body) = self
                .responses
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| StraicoError::transport("no scripted response left"))?;
            Ok(HttpResponse {
                status,
                body: body.into_bytes(),
            })
        }
    }

    /// Never answers, like a request stuck on the network.
    struct PendingTransport;

    #[async_trait]
    impl HttpTransport for PendingTransport {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, StraicoError> {
            std::future::pending().await
        }
    }

    const ANSWER: &str = r#"{"success": true, "data": {
        "completion": {"model": "openai/gpt-4o", "choices": [{"message": {"content": "Paris."}}]},
        "price": {"total": 1}, "words": {"total": 2}
    }}"#;

    const CATALOG: &str = r#"{"success": true, "data": {"chat": [
        {"name": "GPT-4o", "model": "openai/gpt-4o", "pricing": {"coins": 4}}
    ]}}"#;

    fn client(transport: Arc<dyn HttpTransport>) -> StraicoClient {
        StraicoClient::new(transport, "test-key", ApiVersion::V1)
    }

    fn options() -> SessionOptions {
        let cli = Cli::parse_from(["straico", "--no-animation"]);
        cli.session_options()
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("utf8 output")
    }

    #[test]
    fn parses_flags_into_session_options() {
        let cli = Cli::parse_from([
            "straico",
            "--pricing",
            "quality",
            "--models",
            "a/one,b/two",
            "--api-version",
            "v0",
            "--response-only",
            "hello",
        ]);
        assert_eq!(cli.mode(), Some(Mode::Single("hello".to_string())));
        assert_eq!(cli.api_version, ApiVersion::V0);
        let options = cli.session_options();
        assert_eq!(options.pricing, PricingMethod::Quality);
        assert_eq!(
            options.models,
            Some(vec!["a/one".to_string(), "b/two".to_string()])
        );
        assert!(options.show_animation);
        assert!(options.response_only);
        assert_eq!(options.routing_note(), "[Querying multiple models: a/one, b/two]");
    }

    #[test]
    fn unknown_pricing_or_version_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["straico", "--pricing", "cheap", "x"]).is_err());
        assert!(Cli::try_parse_from(["straico", "--api-version", "v2", "x"]).is_err());
    }

    #[test]
    fn no_prompt_means_no_mode() {
        assert_eq!(Cli::parse_from(["straico"]).mode(), None);
        assert_eq!(Cli::parse_from(["straico", "-l", "x"]).mode(), Some(Mode::ListModels));
        assert_eq!(Cli::parse_from(["straico", "-i"]).mode(), Some(Mode::Interactive));
    }

    #[tokio::test]
    async fn single_prompt_prints_completion_text() {
        let transport = ScriptedTransport::with(&[(200, ANSWER)]);
        let client = client(transport.clone());
        let mut out = Vec::new();
        run(
            Mode::Single("Capital of France?".to_string()),
            &client,
            &options(),
            tokio::io::empty(),
            &mut out,
            std::future::pending(),
        )
        .await
        .expect("run");

        let out = output(out);
        assert!(out.contains("Paris."), "output: {out}");
        assert!(out.contains("🤖 Model: openai/gpt-4o"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn interactive_session_skips_blanks_and_stops_at_quit_word() {
        let transport = ScriptedTransport::with(&[(200, ANSWER), (200, CATALOG)]);
        let client = client(transport.clone());
        let input: &[u8] = b"\n   \nCapital of France?\n/history\n/models\n/models\nQUIT\nnever sent\n";
        let mut out = Vec::new();
        run_interactive(&client, &options(), input, &mut out, std::future::pending())
            .await
            .expect("session");

        let out = output(out);
        assert!(out.starts_with("🤖 Straico CLI - Interactive Mode"));
        assert!(out.contains("Pricing Method: balance"));
        assert!(out.contains("[1] You: Capital of France?\n    AI: Paris."));
        assert_eq!(out.matches("Found 1 chat models").count(), 2);
        assert!(out.trim_end().ends_with("Goodbye!"));
        // one completion, one catalog fetch cached for the second /models
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn interactive_errors_end_only_their_iteration() {
        let transport = ScriptedTransport::with(&[
            (500, r#"{"error": "upstream exploded"}"#),
            (200, ANSWER),
        ]);
        let client = client(transport.clone());
        let input: &[u8] = b"first\nsecond\n";
        let mut out = Vec::new();
        run_interactive(&client, &options(), input, &mut out, std::future::pending())
            .await
            .expect("session survives errors");

        let out = output(out);
        assert!(out.contains("❌ Error: upstream exploded (HTTP 500)"), "output: {out}");
        assert!(out.contains("Paris."));
        assert!(out.trim_end().ends_with("Goodbye!"));
    }

    #[tokio::test]
    async fn interrupt_during_request_ends_session_cleanly() {
        let client = client(Arc::new(PendingTransport));
        let input: &[u8] = b"this will hang\n";
        let mut out = Vec::new();
        let interrupt = tokio::time::sleep(Duration::from_millis(50));
        run_interactive(&client, &options(), input, &mut out, interrupt)
            .await
            .expect("interrupt is not an error");

        assert!(output(out).trim_end().ends_with("Goodbye!"));
    }

    #[tokio::test]
    async fn interrupt_in_single_mode_is_reported() {
        let client = client(Arc::new(PendingTransport));
        let mut out = Vec::new();
        let result = run(
            Mode::Single("hang".to_string()),
            &client,
            &options(),
            tokio::io::empty(),
            &mut out,
            tokio::time::sleep(Duration::from_millis(20)),
        )
        .await;
        assert!(matches!(result, Err(StraicoError::Interrupted)));
    }

    #[tokio::test]
    async fn invalid_quantity_is_rejected_without_a_request() {
        let transport = ScriptedTransport::with(&[]);
        let client = client(transport.clone());
        let mut options = options();
        options.quantity = Some(7);
        let mut out = Vec::new();
        let result = run_single(&client, &options, "hello", &mut out).await;
        assert!(matches!(result, Err(StraicoError::Validation { .. })));
        assert_eq!(transport.request_count(), 0);
    }
}
