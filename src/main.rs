use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use gitpal::audit::AuditLogger;
use gitpal::chat::message::{ChatMessage, Sender};
use gitpal::chat::store::JsonFileStore;
use gitpal::config::Config;
use gitpal::dispatch::{Dispatcher, Inbound, Outbound};
use gitpal::git::executor::CommandExecutor;
use gitpal::git::{GitVersion, Repository};
use gitpal::llm::EndpointClient;
use gitpal::security::validator::CommandValidator;

/// Write one outbound envelope as a JSON line on stdout
fn emit(outbound: &Outbound) {
    match serde_json::to_string(outbound) {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "failed to encode outbound envelope"),
    }
}

/// Surface a startup failure as a chat message before exiting
fn emit_fatal(text: String) {
    emit(&Outbound::AddResponse {
        message: ChatMessage::new(Sender::Error, text),
    });
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Envelopes own stdout; diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitpal=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match GitVersion::validate() {
        Ok(version) => debug!(%version, "git preflight ok"),
        Err(e) => {
            emit_fatal(format!("Git is not usable: {e}"));
            std::process::exit(1);
        }
    }

    let config = match Config::load_or_default() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "invalid config, falling back to defaults");
            Config::default()
        }
    };

    // Workspace root: first argument, or the current directory
    let workspace_root = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir()?,
    };
    let workspace_root = workspace_root.canonicalize().unwrap_or(workspace_root);

    if !workspace_root.is_dir() {
        emit_fatal(gitpal::GitError::NoWorkspace.to_string());
        std::process::exit(1);
    }

    let repo = match Repository::discover_from(&workspace_root) {
        Ok(repo) => repo,
        Err(e) => {
            emit_fatal(format!(
                "Cannot start in {}: {e}",
                workspace_root.display()
            ));
            std::process::exit(1);
        }
    };

    let model = match EndpointClient::with_options(
        config.llm.endpoint.clone(),
        config.llm.model.clone(),
        config.llm.temperature,
        config.llm.max_tokens,
        Duration::from_secs(config.llm.timeout_seconds),
    ) {
        Ok(client) => client,
        Err(e) => {
            emit_fatal(format!("Cannot build LLM client: {e}"));
            std::process::exit(1);
        }
    };

    let executor = CommandExecutor::with_limits(
        &workspace_root,
        CommandValidator::new(config.executor.policy),
        Duration::from_secs(config.executor.timeout_seconds),
        config.executor.max_output_bytes,
    );

    let store_path = JsonFileStore::default_path().unwrap_or_else(|_| {
        workspace_root.join(".gitpal-sessions.json")
    });
    let store = JsonFileStore::new(store_path);

    let mut dispatcher = Dispatcher::new(
        repo,
        executor,
        Box::new(model),
        Box::new(store),
        config.chat.history_cap,
        config.chat.session_cap,
    )
    .with_confirm_dangerous(config.executor.confirm_dangerous_ops);

    if config.executor.log_commands {
        match AuditLogger::new() {
            Ok(audit) => dispatcher = dispatcher.with_audit(audit),
            Err(e) => warn!(error = %e, "audit log unavailable"),
        }
    }

    for envelope in dispatcher.startup() {
        emit(&envelope);
    }

    // One envelope in, fully processed, envelopes out; then the next
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Inbound>(line) {
            Ok(inbound) => {
                for envelope in dispatcher.handle(inbound).await {
                    emit(&envelope);
                }
            }
            Err(e) => {
                warn!(error = %e, "malformed inbound envelope");
                emit(&Outbound::AddResponse {
                    message: ChatMessage::new(
                        Sender::Error,
                        format!("Malformed message from host: {e}"),
                    ),
                });
            }
        }
    }

    Ok(())
}
