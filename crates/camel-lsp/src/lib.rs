//! Language Server Protocol implementation for Apache Camel.
//!
//! This crate provides an LSP server for the endpoint URIs of Camel routes
//! written in XML, Java, YAML or properties files, and for Camel K
//! modelines.
//!
//! Features:
//! - Endpoint validation against a component catalog
//! - Completion for components, path parameters, options and values
//! - Modeline completion, hover and duplicate trait detection
//! - Hover documentation
//! - "Did you mean" quick-fixes and connector URL refactorings
//! - References and go-to-definition between `direct`/`seda` endpoints
//! - Document symbols and folding ranges for routes

pub mod backend;
pub mod catalog;
pub mod code_actions;
pub mod completion;
pub mod config;
pub mod diagnostics;
pub mod dialect;
pub mod document;
pub mod error;
pub mod hover;
pub mod modeline;
pub mod position;
pub mod references;
pub mod symbols;
pub mod uri;

pub use backend::CamelLanguageServer;
pub use config::Config;
pub use error::{Error, Result};

use tower_lsp::{LspService, Server};

/// Run the LSP server over stdio.
///
/// This function blocks until the client disconnects.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(move |client| CamelLanguageServer::with_config(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
