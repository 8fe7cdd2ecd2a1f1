//! Conversation orchestration between the model and the tool backend.
//!
//! Drives one conversation strictly sequentially: a single outstanding
//! completion request, then the full batch of requested tool calls, then
//! the next completion, until the model answers without tool calls.

use console::style;

use dbchat_core::tools::ToolDeclaration;
use dbchat_core::{Error, Result};

use crate::llm::{ChatMessage, CompletionClient, ToolCall};

/// Boundary to the tool-execution transport.
pub trait ToolBackend {
    /// Declarations fetched once at startup; passed verbatim to the model.
    fn declarations(&self) -> &[ToolDeclaration];

    /// Execute one tool call. Always returns a string: transport and
    /// handler failures are formatted, not raised, because the model is the
    /// only consumer able to react to them.
    fn call_tool(&self, name: &str, args_json: &str) -> impl Future<Output = String> + Send;
}

/// Orchestrates a single conversation against a completion client and an
/// optional tool backend (absent in degraded, model-only mode).
pub struct Orchestrator<C, B> {
    client: C,
    backend: Option<B>,
    history: Vec<ChatMessage>,
    max_rounds: usize,
    show_activity: bool,
}

impl<C: CompletionClient, B: ToolBackend> Orchestrator<C, B> {
    pub fn new(client: C, backend: Option<B>, max_rounds: usize) -> Self {
        Self {
            client,
            backend,
            history: Vec::new(),
            max_rounds,
            show_activity: false,
        }
    }

    /// Print tool activity to the terminal while processing.
    pub fn with_activity_output(mut self) -> Self {
        self.show_activity = true;
        self
    }

    /// Install the system message. Set at most once, before the first user
    /// message.
    pub fn set_system_message(&mut self, content: impl Into<String>) {
        if self.history.is_empty() {
            self.history.push(ChatMessage::system(content));
        }
    }

    /// Full conversation history, oldest first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Whether a tool backend is connected.
    pub fn has_tools(&self) -> bool {
        self.backend.is_some()
    }

    /// Release the tool backend for shutdown.
    pub fn into_backend(self) -> Option<B> {
        self.backend
    }

    /// Process one user message to a final answer.
    ///
    /// Every tool-call id emitted by the model is answered by exactly one
    /// tool-result message, in issue order, before the next completion
    /// request; the model API contract requires that pairing.
    pub async fn process_message(&mut self, user_input: &str) -> Result<String> {
        self.history.push(ChatMessage::user(user_input));

        let declarations: Vec<ToolDeclaration> = self
            .backend
            .as_ref()
            .map(|backend| backend.declarations().to_vec())
            .unwrap_or_default();

        for round in 0..self.max_rounds {
            let turn = self.client.complete(&self.history, &declarations).await?;

            if turn.is_final() {
                let answer = turn.content.clone().unwrap_or_default();
                self.history.push(ChatMessage::assistant(turn.content, Vec::new()));
                return Ok(answer);
            }

            tracing::debug!(round, calls = turn.tool_calls.len(), "dispatching tool batch");

            if self.show_activity
                && let Some(content) = turn.content.as_deref().filter(|c| !c.is_empty())
            {
                println!("\n{} {content}", style("Assistant:").bold());
            }

            self.history
                .push(ChatMessage::assistant(turn.content, turn.tool_calls.clone()));

            for call in &turn.tool_calls {
                let result = self.dispatch(call).await;
                self.history
                    .push(ChatMessage::tool_result(call.id.clone(), result));
            }
        }

        Err(Error::Llm(format!(
            "model did not produce a final answer within {} completion rounds",
            self.max_rounds
        )))
    }

    async fn dispatch(&self, call: &ToolCall) -> String {
        let name = call.function.name.as_str();

        let Some(backend) = self.backend.as_ref() else {
            return format!("Unknown function: {name}");
        };
        if !backend.declarations().iter().any(|decl| decl.name == name) {
            return format!("Unknown function: {name}");
        }

        if self.show_activity {
            println!(
                "{}",
                style(format!("[tool] {name} {}", call.function.arguments)).dim()
            );
        }

        backend.call_tool(name, &call.function.arguments).await
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
