//! Generated-output request for the FSM language server.
//!
//! The client sends `fsm/generate` with a document URI and receives the
//! generator's JSON rendering of the document's current model.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::Url;

use crate::ide::DocumentState;
use crate::language::Generator;

/// Parameters for the `fsm/generate` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateParams {
    /// The document URI to generate from.
    pub uri: Url,
    /// Whether to pretty-print the JSON (default: true).
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_true() -> bool {
    true
}

/// Response for the `fsm/generate` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// The generated text; empty on failure.
    pub output: String,
    /// Document version the output was generated from.
    pub version: i32,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generates output for a document. Broken documents are reported, not
/// generated from a stale model.
pub fn generate_document(
    generator: &dyn Generator,
    state: &DocumentState,
    pretty: bool,
) -> GenerateResponse {
    let result = match &state.parsed {
        Ok(model) => generator
            .generate(model, pretty)
            .map_err(|e| format!("Generation error: {e}")),
        Err(e) => Err(format!("Parse error: {e}")),
    };

    match result {
        Ok(output) => GenerateResponse {
            output,
            version: state.version,
            success: true,
            error: None,
        },
        Err(error) => GenerateResponse {
            output: String::new(),
            version: state.version,
            success: false,
            error: Some(error),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ide::DocumentStore;
    use crate::language::{GrammarParser, JsonGenerator, LanguageInfo};
    use std::sync::Arc;

    async fn state_for(text: &str) -> DocumentState {
        let store = DocumentStore::new(Arc::new(GrammarParser));
        store
            .upsert(Url::parse("file:///g.fsm").unwrap(), text.to_string(), 4)
            .await
    }

    #[tokio::test]
    async fn generates_from_parsed_document() {
        let generator = JsonGenerator::new(Arc::new(LanguageInfo::default()));
        let state = state_for("machine M\nstate A initial").await;
        let response = generate_document(&generator, &state, false);
        assert!(response.success);
        assert_eq!(response.version, 4);
        assert!(response.output.contains("\"machine\":\"M\""));
    }

    #[tokio::test]
    async fn reports_parse_errors() {
        let generator = JsonGenerator::new(Arc::new(LanguageInfo::default()));
        let state = state_for("machine").await;
        let response = generate_document(&generator, &state, true);
        assert!(!response.success);
        assert!(response.error.unwrap().starts_with("Parse error"));
    }

    #[test]
    fn params_default_to_pretty() {
        let params: GenerateParams =
            serde_json::from_str(r#"{"uri":"file:///g.fsm"}"#).unwrap();
        assert!(params.pretty);
    }
}
