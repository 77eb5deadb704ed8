//! Server capability declarations for the FSM language server.
//!
//! This module returns the `ServerCapabilities` struct that tells the client
//! which LSP features this server supports.

use tower_lsp::lsp_types::*;

/// Returns the server capabilities to be sent during initialization.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full document sync - receive entire document on each change
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(SaveOptions::default().into()),
                ..Default::default()
            },
        )),
        document_formatting_provider: Some(OneOf::Left(true)),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![" ".to_string()]),
            ..Default::default()
        }),
        hover_provider: Some(HoverProviderCapability::Simple(true)),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        ..Default::default()
    }
}
