//! LSP backend implementation for Camel endpoint URIs.
//!
//! This module implements the Language Server Protocol handler
//! using tower-lsp. Every handler is a thin adapter: it takes a snapshot
//! of the document, awaits the active catalog and hands both to an engine.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, error, info};
use serde_json::Value;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::catalog::{Catalog, CatalogCache, CatalogSettings};
use crate::code_actions::{get_code_actions, CodeActionRequest};
use crate::completion::{get_completions, CompletionRequest};
use crate::config::{Config, LspSettings};
use crate::diagnostics::compute_diagnostics;
use crate::dialect::Dialect;
use crate::document::{Document, DocumentStore};
use crate::hover::get_hover;
use crate::references::EndpointIndex;
use crate::symbols::{document_symbols, folding_ranges};

/// Camel Language Server.
pub struct CamelLanguageServer {
    /// The LSP client connection.
    client: Client,
    /// Document store for open files.
    documents: DocumentStore,
    /// Endpoints of open files, for references.
    endpoints: EndpointIndex,
    /// Component catalogs, one load per configuration.
    catalogs: CatalogCache,
    /// Catalog settings from the config file, before editor overrides.
    base_settings: CatalogSettings,
    validate_on_change: bool,
}

impl CamelLanguageServer {
    /// Create a server with the default configuration.
    pub fn new(client: Client) -> Self {
        Self::with_config(client, Config::default())
    }

    pub fn with_config(client: Client, config: Config) -> Self {
        Self {
            client,
            documents: DocumentStore::new(),
            endpoints: EndpointIndex::new(),
            catalogs: CatalogCache::new(config.catalog.clone()),
            base_settings: config.catalog,
            validate_on_change: config.server.validate_on_change,
        }
    }

    /// Document text, dialect and on-disk path of an open document.
    fn snapshot(&self, uri: &Url) -> Option<(Document, Dialect, Option<PathBuf>)> {
        let dialect = Dialect::from_uri(uri)?;
        let doc = self.documents.get(uri)?;
        Some((doc, dialect, uri.to_file_path().ok()))
    }

    async fn catalog(&self) -> Option<Arc<Catalog>> {
        match self.catalogs.current().await {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                error!("Component catalog unavailable: {}", e);
                None
            }
        }
    }

    /// Rebuild the endpoint index of a document.
    fn index(&self, uri: &Url) {
        if let Some((doc, dialect, _)) = self.snapshot(uri) {
            self.endpoints.update(uri, &doc, dialect);
        }
    }

    async fn diagnostics(&self, uri: &Url) -> Option<(Vec<Diagnostic>, i32)> {
        let (doc, dialect, _) = self.snapshot(uri)?;
        let catalog = self.catalog().await?;
        Some((compute_diagnostics(&doc, dialect, &catalog), doc.version))
    }

    /// Validate a document and publish the diagnostics.
    async fn validate_and_publish(&self, uri: Url) {
        if let Some((diagnostics, version)) = self.diagnostics(&uri).await {
            debug!("Publishing {} diagnostics for {}", diagnostics.len(), uri);
            self.client
                .publish_diagnostics(uri, diagnostics, Some(version))
                .await;
        }
    }

    /// Apply editor settings on top of the config file and revalidate
    /// when the catalog changed.
    async fn apply_settings(&self, value: &Value) {
        let settings = LspSettings::from_json(value).apply(&self.base_settings);
        if self.catalogs.configure(settings).await {
            for uri in self.documents.uris() {
                self.validate_and_publish(uri).await;
            }
        }
    }
}

/// Capabilities announced in the `initialize` response.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                ..Default::default()
            },
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(
                [":", "?", "&", "=", ".", "/"]
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
            ),
            resolve_provider: Some(false),
            ..Default::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![
                CodeActionKind::QUICKFIX,
                CodeActionKind::REFACTOR_REWRITE,
            ]),
            ..Default::default()
        })),
        diagnostic_provider: Some(DiagnosticServerCapabilities::Options(DiagnosticOptions {
            identifier: Some("camel".to_string()),
            inter_file_dependencies: false,
            workspace_diagnostics: false,
            ..Default::default()
        })),
        ..Default::default()
    }
}

fn full_report(items: Vec<Diagnostic>) -> DocumentDiagnosticReportResult {
    DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(
        RelatedFullDocumentDiagnosticReport {
            related_documents: None,
            full_document_diagnostic_report: FullDocumentDiagnosticReport {
                result_id: None,
                items,
            },
        },
    ))
}

#[async_trait::async_trait]
impl LanguageServer for CamelLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = &params.initialization_options {
            self.apply_settings(options).await;
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "camel-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let settings = self.catalogs.settings().await;
        info!(
            "Camel LSP server initialized, catalog {} ({})",
            settings.version, settings.runtime_provider
        );
        self.client
            .log_message(MessageType::INFO, "Camel LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents
            .open(uri.clone(), &params.text_document.text, params.text_document.version);
        self.index(&uri);
        self.validate_and_publish(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // FULL sync: the last change holds the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.update(&uri, &change.text, version);
            self.index(&uri);
            if self.validate_on_change {
                self.validate_and_publish(uri).await;
            }
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.validate_and_publish(params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.close(&uri);
        self.endpoints.remove(&uri);

        // Clear diagnostics
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        self.apply_settings(&params.settings).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let Some((doc, dialect, path)) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(catalog) = self.catalog().await else {
            return Ok(None);
        };

        let request = CompletionRequest {
            document: &doc,
            dialect,
            position: params.text_document_position.position,
            path: path.as_deref(),
        };
        Ok(Some(CompletionResponse::Array(get_completions(&request, &catalog))))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let Some((doc, dialect, path)) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(catalog) = self.catalog().await else {
            return Ok(None);
        };

        let request = CompletionRequest {
            document: &doc,
            dialect,
            position: params.text_document_position_params.position,
            path: path.as_deref(),
        };
        Ok(get_hover(&request, &catalog))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some((doc, dialect, path)) = self.snapshot(&uri) else {
            return Ok(None);
        };
        let Some(catalog) = self.catalog().await else {
            return Ok(None);
        };

        let request = CodeActionRequest {
            uri: &uri,
            document: &doc,
            dialect,
            path: path.as_deref(),
            range: params.range,
            diagnostics: &params.context.diagnostics,
            only: params.context.only.as_deref(),
        };
        Ok(Some(get_code_actions(&request, &catalog)))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let position = params.text_document_position;
        Ok(Some(
            self.endpoints
                .references(&position.text_document.uri, position.position),
        ))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        Ok(self
            .endpoints
            .definition(&position.text_document.uri, position.position))
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> Result<Option<DocumentSymbolResponse>> {
        let Some((doc, dialect, _)) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(DocumentSymbolResponse::Nested(document_symbols(&doc, dialect))))
    }

    async fn folding_range(&self, params: FoldingRangeParams) -> Result<Option<Vec<FoldingRange>>> {
        let Some((doc, dialect, _)) = self.snapshot(&params.text_document.uri) else {
            return Ok(None);
        };
        Ok(Some(folding_ranges(&doc, dialect)))
    }

    async fn diagnostic(
        &self,
        params: DocumentDiagnosticParams,
    ) -> Result<DocumentDiagnosticReportResult> {
        let items = self
            .diagnostics(&params.text_document.uri)
            .await
            .map(|(diagnostics, _)| diagnostics)
            .unwrap_or_default();
        Ok(full_report(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        let capabilities = server_capabilities();
        match capabilities.text_document_sync {
            Some(TextDocumentSyncCapability::Options(options)) => {
                assert_eq!(options.change, Some(TextDocumentSyncKind::FULL));
                assert!(options.save.is_some());
            }
            other => panic!("unexpected sync capability: {other:?}"),
        }
        let triggers = capabilities.completion_provider.unwrap().trigger_characters.unwrap();
        assert!(triggers.contains(&"?".to_string()));
        assert!(capabilities.references_provider.is_some());
        assert!(capabilities.folding_range_provider.is_some());
    }

    #[test]
    fn test_full_report_wraps_items() {
        match full_report(Vec::new()) {
            DocumentDiagnosticReportResult::Report(DocumentDiagnosticReport::Full(report)) => {
                assert!(report.full_document_diagnostic_report.items.is_empty());
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }
}
