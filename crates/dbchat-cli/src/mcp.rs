//! MCP client backend: spawns the dbchat-mcp server as a child process and
//! routes tool calls to it over stdio.

use std::path::Path;

use rmcp::{
    RoleClient, ServiceExt,
    model::CallToolRequestParam,
    service::RunningService,
    transport::TokioChildProcess,
};
use tokio::process::Command;

use dbchat_core::tools::ToolDeclaration;
use dbchat_core::{Error, Result};

use crate::orchestrator::ToolBackend;

pub struct McpBackend {
    service: RunningService<RoleClient, ()>,
    declarations: Vec<ToolDeclaration>,
}

impl McpBackend {
    /// Spawn the server binary and fetch its tool listing.
    pub async fn connect(server_bin: &Path, database: &Path) -> Result<Self> {
        let mut command = Command::new(server_bin);
        command.arg("--database").arg(database);

        let transport = TokioChildProcess::new(command)
            .map_err(|e| Error::Tool(format!("failed to spawn MCP server: {e}")))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| Error::Tool(format!("MCP handshake failed: {e}")))?;

        let listing = service
            .list_tools(Default::default())
            .await
            .map_err(|e| Error::Tool(format!("failed to list MCP tools: {e}")))?;

        let declarations = listing
            .tools
            .into_iter()
            .map(|tool| ToolDeclaration {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                input_schema: serde_json::Value::Object((*tool.input_schema).clone()),
            })
            .collect();

        Ok(Self {
            service,
            declarations,
        })
    }

    /// Stop the server child process.
    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| Error::Tool(format!("failed to stop MCP server: {e}")))?;
        Ok(())
    }
}

impl ToolBackend for McpBackend {
    fn declarations(&self) -> &[ToolDeclaration] {
        &self.declarations
    }

    async fn call_tool(&self, name: &str, args_json: &str) -> String {
        let arguments = match serde_json::from_str::<serde_json::Value>(args_json) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            Ok(serde_json::Value::Null) => None,
            Ok(other) => {
                return format!("Invalid JSON arguments for {name}: expected an object, got {other}");
            }
            Err(err) => return format!("Invalid JSON arguments for {name}: {err}"),
        };

        let result = self
            .service
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments,
                meta: None,
                task: None,
            })
            .await;

        match result {
            Ok(response) => {
                let text: Vec<&str> = response
                    .content
                    .iter()
                    .filter_map(|part| part.as_text().map(|t| t.text.as_str()))
                    .collect();
                if text.is_empty() {
                    "No result returned from tool".to_string()
                } else {
                    text.join("\n")
                }
            }
            Err(err) => format!("Error calling tool {name}: {err}"),
        }
    }
}
