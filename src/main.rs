use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing::{error, info, warn};

use herald_assistant::{AssistantClient, CreateAssistantRequest};
use herald_core::{
    Disposition, EnvSource, HeraldConfig, HeraldError, ProcessEnv, PromptSource, StdinPrompt,
};
use herald_review::{compose_instructions, ReviewHandler, ToolCallLoop};
use herald_toolset::{Capability, ToolsetClient, TriggerListener};

#[derive(Parser)]
#[command(
    name = "herald",
    version,
    about = "Hosted-assistant pull request review relay",
    long_about = "Herald wires a PR review workflow together: a tool-integration service\n\
                   relays 'pull request opened' events, and a hosted assistant reviews each\n\
                   one through four remote capabilities (fetch PR, review PR, create issue,\n\
                   send chat message).\n\n\
                   Examples:\n  \
                     herald                 Start listening for pull request events\n  \
                     herald listen          Same, explicitly\n  \
                     herald doctor          Check credentials and endpoint selection\n  \
                     herald init            Create a default herald.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: herald.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for pull request events and review each one (the default)
    #[command(long_about = "Wait for pull request events and review each one.\n\n\
        Registers the review assistant, subscribes to the configured trigger, and\n\
        handles events sequentially until interrupted. Ctrl-C exits cleanly.\n\n\
        Examples:\n  herald listen\n  CHANNEL_ID=C123 herald listen")]
    Listen,
    /// Check your Herald setup and environment
    #[command(long_about = "Check your Herald setup and environment.\n\n\
        Reports which credentials are visible, which assistant endpoint would be\n\
        selected, and whether startup would succeed, without making remote calls.")]
    Doctor,
    /// Create a default herald.toml configuration file
    #[command(long_about = "Create a default herald.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if herald.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    // Missing .env is fine; a malformed one is not silently ignored.
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => miette::bail!("failed to load .env: {e}"),
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => HeraldConfig::from_file(path).into_diagnostic()?,
        None => {
            let default_path = std::path::Path::new("herald.toml");
            if default_path.exists() {
                HeraldConfig::from_file(default_path).into_diagnostic()?
            } else {
                HeraldConfig::default()
            }
        }
    };

    match cli.command {
        None | Some(Command::Listen) => run_listen(config).await,
        Some(Command::Doctor) => run_doctor(&config),
        Some(Command::Init) => run_init(),
        Some(Command::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "herald", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_listen(config: HeraldConfig) -> Result<()> {
    let runtime = config
        .resolve(&ProcessEnv, &mut StdinPrompt)
        .into_diagnostic()
        .wrap_err("startup configuration is incomplete")?;
    info!(channel = %runtime.channel_id, "using channel");
    match &runtime.target {
        herald_core::ApiTarget::Proxy { base_url, .. } => {
            info!(%base_url, "assistant client initialized against proxy endpoint");
        }
        herald_core::ApiTarget::Direct { .. } => {
            info!("assistant client initialized against direct endpoint");
        }
    }

    let assistant_client = Arc::new(AssistantClient::new(&runtime.target).into_diagnostic()?);
    let toolset_client = Arc::new(
        ToolsetClient::new(&runtime.toolset_base_url, &runtime.toolset_api_key).into_diagnostic()?,
    );

    let request = CreateAssistantRequest {
        name: runtime.assistant_name.clone(),
        description: runtime.assistant_description.clone(),
        instructions: compose_instructions(&runtime.channel_id),
        model: runtime.model.clone(),
        tools: Capability::tool_definitions(),
    };
    let assistant = assistant_client
        .create_assistant(&request)
        .await
        .into_diagnostic()
        .wrap_err("assistant registration failed")?;
    info!(assistant_id = %assistant.id, model = %runtime.model, "assistant registered");
    eprintln!("Assistant is ready");

    let resolver = Arc::new(ToolCallLoop::new(
        Arc::clone(&assistant_client),
        toolset_client,
        runtime.poll_interval,
        runtime.run_timeout,
    ));
    let handler = ReviewHandler::new(assistant_client, assistant.id, resolver);

    let listener = TriggerListener::new(
        &runtime.toolset_base_url,
        &runtime.toolset_api_key,
        &runtime.trigger,
    )
    .into_diagnostic()?;
    let mut stream = listener
        .subscribe()
        .await
        .into_diagnostic()
        .wrap_err("trigger subscription failed")?;
    eprintln!("Listener started!");
    eprintln!("Create a PR to get the review");

    // One event in flight at a time; the stream is not read while handling.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                return Ok(());
            }
            next = stream.next_event() => match next {
                Ok(Some(event)) => handle_event(&handler, &event).await?,
                Ok(None) => miette::bail!("event stream ended; the integration service hung up"),
                Err(e) => {
                    return Err(e)
                        .into_diagnostic()
                        .wrap_err("event stream failed");
                }
            }
        }
    }
}

async fn handle_event(handler: &ReviewHandler, event: &herald_core::TriggerEvent) -> Result<()> {
    let Err(e) = handler.handle(event).await else {
        return Ok(());
    };
    match e.disposition() {
        Disposition::FatalStartup => Err(e).into_diagnostic(),
        Disposition::FatalEvent => {
            error!(error = %e, "review failed; event abandoned");
            Ok(())
        }
        Disposition::RetryableEvent => {
            warn!(error = %e, "review failed; waiting for the next event");
            Ok(())
        }
    }
}

fn run_doctor(config: &HeraldConfig) -> Result<()> {
    let env = ProcessEnv;

    let channel = env
        .var("CHANNEL_ID")
        .map(|_| "CHANNEL_ID env var".to_string())
        .or_else(|| {
            config
                .channel
                .id
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|_| "herald.toml [channel]".to_string())
        });
    report("channel id", channel.as_deref(), "would prompt interactively");

    let proxy = env.var("OPENROUTER_API_KEY").is_some()
        || config
            .assistant
            .proxy_api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
    let direct = env.var("OPENAI_API_KEY").is_some()
        || config
            .assistant
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
    report(
        "proxy credential",
        proxy.then_some("OPENROUTER_API_KEY"),
        "not set",
    );
    report(
        "direct credential",
        direct.then_some("OPENAI_API_KEY"),
        "not set",
    );

    let toolset = env.var("COMPOSIO_API_KEY").is_some()
        || config
            .toolset
            .api_key
            .as_deref()
            .is_some_and(|v| !v.trim().is_empty());
    report(
        "toolset credential",
        toolset.then_some("COMPOSIO_API_KEY"),
        "not set",
    );

    // Dry-run resolution with the prompt stubbed out so doctor never blocks
    // on stdin.
    struct NoPrompt;
    impl PromptSource for NoPrompt {
        fn prompt_line(&mut self, _message: &str) -> Result<String, HeraldError> {
            Ok(String::new())
        }
    }

    match config.resolve(&ProcessEnv, &mut NoPrompt) {
        Ok(runtime) => {
            let endpoint = match runtime.target {
                herald_core::ApiTarget::Proxy { ref base_url, .. } => {
                    format!("proxy ({base_url})")
                }
                herald_core::ApiTarget::Direct { .. } => "direct provider".to_string(),
            };
            println!("  ok  endpoint: {endpoint}");
            println!("  ok  model: {}", runtime.model);
            println!("  ok  trigger: {}", runtime.trigger);
            println!("\nStartup would succeed.");
            Ok(())
        }
        Err(e) => {
            println!("\nStartup would fail: {e}");
            miette::bail!(miette::miette!(
                help = "Run `herald init` for a config template, or export the missing variables",
                "herald is not ready to listen"
            ));
        }
    }
}

fn report(label: &str, found: Option<&str>, missing: &str) {
    match found {
        Some(source) => println!("  ok  {label}: {source}"),
        None => println!("  --  {label}: {missing}"),
    }
}

fn run_init() -> Result<()> {
    let path = std::path::Path::new("herald.toml");
    if path.exists() {
        miette::bail!("herald.toml already exists; refusing to overwrite");
    }
    std::fs::write(path, CONFIG_TEMPLATE).into_diagnostic()?;
    eprintln!("Wrote herald.toml");
    Ok(())
}

const CONFIG_TEMPLATE: &str = r#"# Herald configuration.
# Env vars override these values; a .env file is loaded at startup.

[assistant]
# Model identifier. Defaults per endpoint when unset:
# "qwen/qwq-32b:free" through the proxy, "gpt-4o" on the direct endpoint.
# model = "gpt-4o"
# Credentials are usually supplied via OPENAI_API_KEY / OPENROUTER_API_KEY.
# api_key = ""
# proxy_api_key = ""
# Proxy base URL (BASE_URL env var also works).
# base_url = "https://openrouter.ai/api/v1"

[toolset]
# Integration service credential; COMPOSIO_API_KEY env var also works.
# api_key = ""
# base_url = "https://backend.composio.dev"
# trigger = "github_pull_request_event"
# Seconds between run status polls.
# poll_interval_secs = 2
# Ceiling on one review's tool-call resolution; 0 disables.
# run_timeout_secs = 600

[channel]
# Destination channel for plain-text summaries (CHANNEL_ID env var also works).
# id = "C0123456789"
"#;
