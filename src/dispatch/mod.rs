pub mod envelope;

use tracing::{debug, warn};

use crate::audit::AuditLogger;
use crate::chat::history::ConversationHistory;
use crate::chat::message::{ChatMessage, MessageAction, Sender};
use crate::chat::session::{ChatSession, SessionSummary};
use crate::chat::store::{self, SessionStore};
use crate::error_translation::translate_git_failure;
use crate::git::Repository;
use crate::git::executor::{CommandExecutor, ExecError};
use crate::llm::classifier::{self, ClassifyError};
use crate::llm::client::ChatModel;
use crate::llm::context::ContextBuilder;
use crate::security::rules::DangerRules;
use crate::security::validator::ValidatedCommand;
use crate::workflow::commit::{CommitEvent, CommitWorkflow, WorkflowError};

pub use envelope::{Inbound, Outbound, QuickAction, action_ids};

/// Owns everything one chat panel needs: the session, its conversation
/// history, the commit workflow, the executor, and the model client.
///
/// One inbound envelope is processed to completion before the next; there is
/// no ambient shared state. Every handler converts its errors into exactly
/// one chat message; nothing here panics the bridge.
pub struct Dispatcher {
    context_builder: ContextBuilder,
    executor: CommandExecutor,
    model: Box<dyn ChatModel>,
    rules: DangerRules,
    workflow: CommitWorkflow,
    history: ConversationHistory,
    session: ChatSession,
    sessions: Vec<ChatSession>,
    store: Box<dyn SessionStore>,
    session_cap: usize,
    /// Validated destructive command awaiting its confirmation button
    pending_command: Option<ValidatedCommand>,
    confirm_dangerous: bool,
    audit: Option<AuditLogger>,
}

impl Dispatcher {
    pub fn new(
        repo: Repository,
        executor: CommandExecutor,
        model: Box<dyn ChatModel>,
        store: Box<dyn SessionStore>,
        history_cap: usize,
        session_cap: usize,
    ) -> Self {
        let sessions = match store.load_all() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "failed to load session store, starting empty");
                Vec::new()
            }
        };

        Self {
            context_builder: ContextBuilder::new(repo),
            executor,
            model,
            rules: DangerRules::builtin(),
            workflow: CommitWorkflow::new(),
            history: ConversationHistory::new(history_cap),
            session: ChatSession::new(),
            sessions,
            store,
            session_cap,
            pending_command: None,
            confirm_dangerous: true,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Disable the destructive-command confirmation gate (config opt-out)
    pub fn with_confirm_dangerous(mut self, confirm: bool) -> Self {
        self.confirm_dangerous = confirm;
        self
    }

    pub fn current_session(&self) -> &ChatSession {
        &self.session
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn workflow(&self) -> &CommitWorkflow {
        &self.workflow
    }

    /// Envelopes the host should apply right after connecting
    pub fn startup(&self) -> Vec<Outbound> {
        vec![self.history_list(), self.buttons_state()]
    }

    /// Process one inbound envelope to completion
    pub async fn handle(&mut self, inbound: Inbound) -> Vec<Outbound> {
        debug!(?inbound, "dispatching");
        let mut out = Vec::new();

        match inbound {
            Inbound::SendMessage { text } => self.handle_send(&mut out, &text).await,
            Inbound::ExecuteCommand { command } => {
                out.push(Outbound::SetLoading { loading: true });
                self.run_command(&mut out, &command).await;
                out.push(Outbound::SetLoading { loading: false });
                out.push(self.buttons_state());
            }
            Inbound::ClearHistory => {
                self.history.clear();
                self.respond(&mut out, Sender::System, "Conversation context cleared.");
            }
            Inbound::QuickButton { id } => self.handle_quick_button(&mut out, id).await,
            Inbound::ActionButton { command_id } => {
                self.handle_action(&mut out, &command_id).await
            }
            Inbound::ChangeModel { model } => {
                self.model.set_model(&model);
                self.respond(
                    &mut out,
                    Sender::System,
                    format!("Model changed to {model}."),
                );
            }
            Inbound::NewChat => self.handle_new_chat(&mut out),
            Inbound::LoadHistory { session_id } => self.handle_load_history(&mut out, &session_id),
        }

        out
    }

    async fn handle_send(&mut self, out: &mut Vec<Outbound>, text: &str) {
        self.echo_user(out, text);

        // While a commit suggestion is pending, free text is an override
        if self.workflow.is_awaiting_decision() {
            out.push(Outbound::SetLoading { loading: true });
            let result = self
                .workflow
                .override_message(&self.executor, &*self.model, text)
                .await;
            self.emit_commit_event(out, result);
            out.push(Outbound::SetLoading { loading: false });
            out.push(self.buttons_state());
            return;
        }

        out.push(Outbound::SetLoading { loading: true });

        let context = match self.context_builder.build(&self.executor.current_dir()) {
            Ok(context) => context,
            Err(e) => {
                self.respond(
                    out,
                    Sender::Error,
                    format!("Could not read repository state: {e}"),
                );
                out.push(Outbound::SetLoading { loading: false });
                return;
            }
        };

        let prior_turns = self.history.to_messages();
        let result = classifier::classify(
            &*self.model,
            &self.rules,
            &context,
            &prior_turns,
            text,
        )
        .await;
        self.history.push_user(text);

        match result {
            Ok(intent) => {
                self.history.push_assistant(&intent.message);

                match &intent.command {
                    None => self.respond(out, Sender::Agent, intent.message.clone()),
                    Some(command) => {
                        let command = command.clone();
                        self.respond(out, Sender::Agent, intent.message.clone());
                        self.run_command(out, &command).await;
                    }
                }
            }
            Err(ClassifyError::Llm(e)) => {
                self.respond(
                    out,
                    Sender::Error,
                    format!(
                        "Cannot reach the model endpoint: {e}. Check that the LLM server is running."
                    ),
                );
            }
            Err(ClassifyError::MalformedResponse(detail)) => {
                self.audit_rejected(text, &detail);
                self.respond(
                    out,
                    Sender::Error,
                    "The model reply could not be understood. Please try rephrasing your request.",
                );
            }
        }

        out.push(Outbound::SetLoading { loading: false });
        out.push(self.buttons_state());
    }

    async fn handle_quick_button(&mut self, out: &mut Vec<Outbound>, action: QuickAction) {
        match action {
            QuickAction::GenerateCommit => {
                self.echo_user(out, action.request_text());
                out.push(Outbound::SetLoading { loading: true });

                let result = self
                    .workflow
                    .start(self.context_builder.repo(), &*self.model)
                    .await;
                self.emit_commit_event(out, result);

                out.push(Outbound::SetLoading { loading: false });
                out.push(self.buttons_state());
            }
            other => self.handle_send(out, other.request_text()).await,
        }
    }

    async fn handle_action(&mut self, out: &mut Vec<Outbound>, command_id: &str) {
        match command_id {
            action_ids::CONFIRM_COMMIT => {
                out.push(Outbound::SetLoading { loading: true });
                let result = self.workflow.confirm(&self.executor).await;
                self.emit_commit_event(out, result);
                out.push(Outbound::SetLoading { loading: false });
                out.push(self.buttons_state());
            }
            action_ids::PUSH_AFTER_COMMIT => {
                out.push(Outbound::SetLoading { loading: true });
                self.run_command(out, "git push").await;
                out.push(Outbound::SetLoading { loading: false });
            }
            action_ids::UNDO_COMMIT => {
                out.push(Outbound::SetLoading { loading: true });
                self.run_command(out, "git reset --soft HEAD~1").await;
                out.push(Outbound::SetLoading { loading: false });
                out.push(self.buttons_state());
            }
            action_ids::CONFIRM_EXECUTE => match self.pending_command.take() {
                Some(validated) => {
                    out.push(Outbound::SetLoading { loading: true });
                    self.run_confirmed(out, validated).await;
                    out.push(Outbound::SetLoading { loading: false });
                    out.push(self.buttons_state());
                }
                None => self.respond(out, Sender::System, "Nothing to confirm."),
            },
            action_ids::CANCEL_EXECUTE => {
                self.pending_command = None;
                self.respond(
                    out,
                    Sender::System,
                    format_exec_error(&ExecError::Cancelled),
                );
            }
            other => {
                self.respond(out, Sender::System, format!("Unknown action: {other}"));
            }
        }
    }

    fn handle_new_chat(&mut self, out: &mut Vec<Outbound>) {
        self.flush();
        self.session = ChatSession::new();
        self.workflow.reset();
        self.pending_command = None;
        self.history.clear();

        out.push(Outbound::ClearChat);
        out.push(self.history_list());
        out.push(self.buttons_state());
    }

    fn handle_load_history(&mut self, out: &mut Vec<Outbound>, session_id: &str) {
        self.flush();

        match self.sessions.iter().find(|s| s.id == session_id).cloned() {
            Some(session) => {
                self.workflow.reset();
                self.pending_command = None;
                self.history = rebuild_history(&session, self.history.cap());
                self.session = session;

                out.push(Outbound::LoadChatHistory {
                    messages: self.session.messages.clone(),
                });
                out.push(self.history_list());
            }
            None => {
                self.respond(out, Sender::Error, format!("Session not found: {session_id}"));
            }
        }
    }

    /// Validate a command and either run it or raise the confirmation gate
    async fn run_command(&mut self, out: &mut Vec<Outbound>, command: &str) {
        let validated = match self.executor.validate(command) {
            Ok(validated) => validated,
            Err(e) => {
                self.audit_rejected(command, &e.to_string());
                self.respond(out, Sender::Error, format_exec_error(&e));
                return;
            }
        };

        if let (Some(op), true) = (validated.danger, self.confirm_dangerous) {
            self.pending_command = Some(validated.clone());
            self.respond_with_actions(
                out,
                Sender::System,
                format!(
                    "This is a destructive command: {} ({}). Are you sure?",
                    validated.command,
                    op.describe()
                ),
                vec![
                    MessageAction::primary("Yes, execute", action_ids::CONFIRM_EXECUTE),
                    MessageAction::secondary("Cancel", action_ids::CANCEL_EXECUTE),
                ],
            );
            return;
        }

        self.run_confirmed(out, validated).await;
    }

    /// Run a command whose confirmation gate (if any) has already passed
    async fn run_confirmed(&mut self, out: &mut Vec<Outbound>, validated: ValidatedCommand) {
        self.respond(
            out,
            Sender::System,
            format!("Running: {}", validated.command),
        );

        match self.executor.run_validated(&validated).await {
            Ok(output) => {
                self.audit_command(&validated.command, output.exit_code);
                let text = output.display_text();
                self.history
                    .record_command_result(&validated.command, &text, true);
                self.respond(out, Sender::Git, text);
            }
            Err(e) => {
                if matches!(e, ExecError::Failed(_)) {
                    self.audit_command(&validated.command, 1);
                }
                let text = format_exec_error(&e);
                self.history
                    .record_command_result(&validated.command, &text, false);
                self.respond(out, Sender::Error, text);
            }
        }
    }

    fn emit_commit_event(
        &mut self,
        out: &mut Vec<Outbound>,
        result: Result<CommitEvent, WorkflowError>,
    ) {
        match result {
            Ok(CommitEvent::NothingToCommit) => {
                self.respond(
                    out,
                    Sender::System,
                    "Nothing to commit. Stage your changes first.",
                );
            }
            Ok(CommitEvent::Suggested { message }) => {
                self.respond_with_actions(
                    out,
                    Sender::Agent,
                    format!(
                        "Suggested commit message:\n\"{message}\"\n\nConfirm to use it, or type your own message."
                    ),
                    vec![MessageAction::primary("Confirm", action_ids::CONFIRM_COMMIT)],
                );
            }
            Ok(CommitEvent::Committed { message, output }) => {
                self.audit_command(&format!("git commit -m {message:?}"), 0);
                self.history.record_command_result(
                    &format!("git commit -m \"{message}\""),
                    &output,
                    true,
                );
                self.respond_with_actions(
                    out,
                    Sender::Git,
                    format!("Committed: {message}\n\n{output}"),
                    vec![
                        MessageAction::primary("Push", action_ids::PUSH_AFTER_COMMIT),
                        MessageAction::secondary("Undo", action_ids::UNDO_COMMIT),
                    ],
                );
            }
            Ok(CommitEvent::IdentityUnknown { detail }) => {
                self.respond(
                    out,
                    Sender::Error,
                    translate_git_failure(&detail).to_chat_text(),
                );
            }
            Err(WorkflowError::Llm(e)) => {
                self.respond(
                    out,
                    Sender::Error,
                    format!(
                        "Cannot reach the model endpoint: {e}. Check that the LLM server is running."
                    ),
                );
            }
            Err(WorkflowError::Exec(e)) => {
                self.respond(out, Sender::Error, format_exec_error(&e));
            }
            Err(e) => {
                self.respond(out, Sender::Error, e.to_string());
            }
        }
    }

    fn echo_user(&mut self, out: &mut Vec<Outbound>, text: &str) {
        let message = ChatMessage::new(Sender::User, text);
        self.session.push(message.clone());
        self.flush();
        out.push(Outbound::AddMessage { message });
    }

    fn respond(&mut self, out: &mut Vec<Outbound>, sender: Sender, text: impl Into<String>) {
        self.respond_with_actions(out, sender, text, Vec::new());
    }

    fn respond_with_actions(
        &mut self,
        out: &mut Vec<Outbound>,
        sender: Sender,
        text: impl Into<String>,
        actions: Vec<MessageAction>,
    ) {
        let message = ChatMessage::with_actions(sender, text, actions);
        self.session.push(message.clone());
        self.flush();
        out.push(Outbound::AddResponse { message });
    }

    /// Write-through: persist the session list after every mutation
    fn flush(&mut self) {
        if self.session.messages.is_empty() {
            return;
        }

        store::upsert(&mut self.sessions, self.session.clone(), self.session_cap);
        if let Err(e) = self.store.save_all(&self.sessions) {
            warn!(error = %e, "failed to persist session store");
        }
    }

    fn history_list(&self) -> Outbound {
        Outbound::UpdateHistoryList {
            sessions: self.sessions.iter().map(SessionSummary::from).collect(),
        }
    }

    /// Degrade controls that cannot work right now instead of failing later
    fn buttons_state(&self) -> Outbound {
        let mut disabled = Vec::new();

        if matches!(self.context_builder.repo().has_staged_changes(), Ok(false)) {
            disabled.push(QuickAction::GenerateCommit.button_id().to_string());
        }

        Outbound::SetButtonsState { disabled }
    }

    fn audit_command(&self, command: &str, exit_code: i32) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(command, self.executor.workspace_root(), exit_code) {
                warn!(error = %e, "failed to write audit log");
            }
        }
    }

    fn audit_rejected(&self, query: &str, reason: &str) {
        if let Some(audit) = &self.audit {
            if let Err(e) =
                audit.log_rejected(query, "", reason, self.executor.workspace_root())
            {
                warn!(error = %e, "failed to write audit log");
            }
        }
    }
}

/// Rebuild model-facing context from a persisted session's chat messages
fn rebuild_history(session: &ChatSession, cap: usize) -> ConversationHistory {
    let mut history = ConversationHistory::new(cap);

    for message in &session.messages {
        match message.sender {
            Sender::User => history.push_user(&message.text),
            Sender::Agent => history.push_assistant(&message.text),
            _ => {}
        }
    }

    history
}

fn format_exec_error(error: &ExecError) -> String {
    match error {
        ExecError::Failed(detail) => translate_git_failure(detail).to_chat_text(),
        ExecError::Cancelled => "Command cancelled by user.".to_string(),
        ExecError::Validation(e) => format!("{e}. Only safe, allow-listed commands can run here."),
        other => other.to_string(),
    }
}
