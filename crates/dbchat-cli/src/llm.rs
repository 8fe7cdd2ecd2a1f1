//! Chat message types and the Azure OpenAI completion client.
//!
//! The completion endpoint is consumed as a black box: ordered message
//! history plus tool declarations in, either a final message or a batch of
//! tool-call requests out. No streaming.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dbchat_core::config::ModelConfig;
use dbchat_core::tools::ToolDeclaration;
use dbchat_core::{Error, Result};

/// A model-issued request to invoke one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation identifier; the paired tool-result message references it.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// JSON-encoded arguments, passed through verbatim.
    pub arguments: String,
}

/// One entry of the conversation history, in OpenAI wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        ChatMessage::Assistant {
            content,
            tool_calls,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// The model's response to one completion request.
#[derive(Debug, Clone)]
pub struct AssistantTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl AssistantTurn {
    /// A turn with no pending tool calls is the final answer, even when the
    /// content is empty.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Boundary to the chat completion endpoint.
pub trait CompletionClient {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> impl Future<Output = Result<AssistantTurn>> + Send;
}

/// Azure OpenAI chat completions client.
pub struct AzureClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl AzureClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::Config(
                "model endpoint is not configured (set DBCHAT_ENDPOINT or config.toml)".to_string(),
            ));
        }
        if config.api_key.is_empty() {
            return Err(Error::Config(
                "model API key is not configured (set DBCHAT_API_KEY)".to_string(),
            ));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            config,
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

impl CompletionClient for AzureClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDeclaration],
    ) -> Result<AssistantTurn> {
        let tool_schemas: Vec<ToolSchema> = tools.iter().map(ToolSchema::from_declaration).collect();

        let request = CompletionRequest {
            messages,
            max_tokens: self.config.max_tokens,
            tools: if tool_schemas.is_empty() {
                None
            } else {
                Some(tool_schemas)
            },
            tool_choice: if tools.is_empty() { None } else { Some("auto") },
            stream: false,
        };

        tracing::debug!(
            messages = messages.len(),
            tools = tools.len(),
            "requesting completion"
        );

        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Llm(format!("completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "completion request failed ({status}): {body}"
            )));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("malformed completion response: {e}")))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("completion response contained no choices".to_string()))?;

        Ok(AssistantTurn {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    stream: bool,
}

/// Tool declaration in OpenAI function format.
#[derive(Serialize)]
struct ToolSchema {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSchema,
}

#[derive(Serialize)]
struct FunctionSchema {
    name: String,
    description: String,
    parameters: Value,
}

impl ToolSchema {
    fn from_declaration(decl: &ToolDeclaration) -> Self {
        Self {
            kind: "function",
            function: FunctionSchema {
                name: decl.name.clone(),
                description: decl.description.clone(),
                parameters: decl.input_schema.clone(),
            },
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_serialize_in_openai_wire_form() {
        let msg = ChatMessage::user("show me revenue by region");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"role": "user", "content": "show me revenue by region"})
        );
    }

    #[test]
    fn assistant_without_tool_calls_omits_the_field() {
        let msg = ChatMessage::assistant(Some("done".to_string()), Vec::new());
        let json = serde_json::to_value(&msg).expect("serialize");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn tool_results_reference_their_call_id() {
        let msg = ChatMessage::tool_result("call_1", "Query Results:\n{}");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
    }

    #[test]
    fn assistant_tool_calls_round_trip() {
        let json = serde_json::json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_7",
                "type": "function",
                "function": {"name": "execute_sales_query", "arguments": "{\"query\":\"SELECT 1 LIMIT 1\"}"}
            }]
        });
        let msg: ChatMessage = serde_json::from_value(json).expect("deserialize");
        let ChatMessage::Assistant {
            content,
            tool_calls,
        } = msg
        else {
            unreachable!("expected assistant message");
        };
        assert!(content.is_none());
        assert_eq!(tool_calls.len(), 1);
        assert_eq!(tool_calls[0].function.name, "execute_sales_query");
    }
}
