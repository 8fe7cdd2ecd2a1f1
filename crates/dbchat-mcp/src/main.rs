//! MCP server exposing the sales database tools over stdio.
//!
//! Tool listing and dispatch are driven by the closed registry in
//! dbchat-core; this binary is transport plumbing around it.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser};
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, ServiceExt,
    model::{
        CallToolRequestParam, CallToolResult, Content, ListToolsResult, PaginatedRequestParam,
        ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    transport::io::stdio,
};

use dbchat_core::{Config, Registry, SchemaProvider};

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .common
        .config
        .unwrap_or_else(Config::default_config_path);
    let mut config = Config::ensure_at(&config_path)?;
    if let Some(database) = cli.common.database {
        config.database = database;
    }

    // Missing database is fatal at startup: there is no useful degraded
    // mode for a tool server without its data.
    let provider = SchemaProvider::open(&config.database).await?;
    let registry = Registry::new(provider, config.display_cap);

    let server = McpServer::new(registry);
    let transport = stdio();

    let service = server
        .serve(transport)
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;
    service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))?;

    Ok(())
}

#[derive(Debug, Parser)]
#[command(author, version, about = "MCP server for the dbchat sales database")]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the database file path
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,
}

#[derive(Clone)]
struct McpServer {
    registry: Arc<Registry>,
}

impl McpServer {
    fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Sales analysis tools for the dbchat retail database. Call the \
                 get_<table>_table_schema tools before writing queries, then use \
                 execute_sales_query with a LIMIT clause."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .registry
            .declarations()
            .into_iter()
            .map(|decl| {
                Tool::new(
                    decl.name,
                    decl.description,
                    Arc::new(decl.input_schema.as_object().cloned().unwrap_or_default()),
                )
            })
            .collect();

        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let args = request
            .arguments
            .map(serde_json::Value::Object)
            .unwrap_or_else(|| serde_json::json!({}));

        let output = self
            .registry
            .dispatch(&request.name, &args.to_string())
            .await;

        Ok(CallToolResult::success(vec![Content::text(output)]))
    }
}
