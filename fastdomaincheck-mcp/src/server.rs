//! MCP tool surface: a single `check_domains` tool backed by `DomainChecker`.

use fastdomaincheck_lib::{DomainCheckError, DomainChecker, MAX_BATCH_SIZE};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Name announced to MCP clients during initialization.
pub const SERVER_NAME: &str = "fastdomaincheck-mcp-server";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CheckDomainsRequest {
    /// List of domain names to check (at most 50)
    pub domains: Vec<String>,
}

#[derive(Clone)]
pub struct DomainServer {
    checker: Arc<DomainChecker>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DomainServer {
    pub fn new(checker: DomainChecker) -> Self {
        Self {
            checker: Arc::new(checker),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Check domain registration status in bulk (up to 50 domains)")]
    async fn check_domains(
        &self,
        Parameters(request): Parameters<CheckDomainsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(count = request.domains.len(), "check_domains called");

        let outcome = self
            .checker
            .check_domains(&request.domains)
            .await
            .and_then(|results| {
                serde_json::to_string_pretty(&results).map_err(|e| {
                    DomainCheckError::internal(format!("failed to encode results: {}", e))
                })
            });

        match outcome {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => {
                tracing::warn!(error = %e, "rejected check_domains request");
                let body = serde_json::json!({ "error": e.to_string() });
                Ok(CallToolResult::error(vec![Content::text(body.to_string())]))
            }
        }
    }
}

#[tool_handler]
impl ServerHandler for DomainServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name = SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = Some(format!(
            "Call check_domains with up to {} fully qualified domain names. \
             Each result reports availability, the method used (whois or dns) \
             and, when DNS answered because WHOIS failed, fallback: true.",
            MAX_BATCH_SIZE
        ));
        info
    }
}
