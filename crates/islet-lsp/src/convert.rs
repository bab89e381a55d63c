//! Conversion between islet-core types and tower_lsp::lsp_types.

use tower_lsp::lsp_types::{
    CompletionItem as LspCompletionItem, CompletionItemKind, Diagnostic as LspDiagnostic,
    DiagnosticSeverity as LspSeverity, DiagnosticTag, Documentation,
    DocumentSymbol as LspDocumentSymbol, Hover, HoverContents, Location as LspLocation,
    MarkupContent, MarkupKind, NumberOrString, ParameterInformation, ParameterLabel,
    Position as LspPosition, Range as LspRange, SignatureHelp as LspSignatureHelp,
    SignatureInformation, SymbolKind as LspSymbolKind, Url,
};

use islet_core::build::BuildResult;
use islet_core::types::{
    CompletionItem, CompletionKind, Diagnostic, Location, ParameterInfo, Position, Range, Severity,
    SignatureHelp, SymbolInfo, SymbolKind, Tooltip, UnusedSymbol,
};

/// Convert an islet-core Position to an lsp-types Position.
pub fn position_to_lsp(pos: &Position) -> LspPosition {
    LspPosition {
        line: pos.line,
        character: pos.character,
    }
}

/// Convert an lsp-types Position to an islet-core Position.
pub fn position_from_lsp(pos: &LspPosition) -> Position {
    Position {
        line: pos.line,
        character: pos.character,
    }
}

/// Convert an islet-core Range to an lsp-types Range.
pub fn range_to_lsp(range: &Range) -> LspRange {
    LspRange {
        start: position_to_lsp(&range.start),
        end: position_to_lsp(&range.end),
    }
}

/// Convert an islet-core Severity to an lsp-types DiagnosticSeverity.
pub fn severity_to_lsp(severity: &Severity) -> LspSeverity {
    match severity {
        Severity::Error => LspSeverity::ERROR,
        Severity::Warning => LspSeverity::WARNING,
        Severity::Information => LspSeverity::INFORMATION,
        Severity::Hint => LspSeverity::HINT,
    }
}

/// Convert an islet-core Diagnostic to an lsp-types Diagnostic.
pub fn diagnostic_to_lsp(diag: &Diagnostic) -> LspDiagnostic {
    LspDiagnostic {
        range: range_to_lsp(&diag.range),
        severity: Some(severity_to_lsp(&diag.severity)),
        code: diag.code.clone().map(NumberOrString::String),
        code_description: None,
        source: diag.source.clone(),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Render an unused symbol as a hint diagnostic tagged `UNNECESSARY`.
///
/// The tag is what makes editors fade the declaration, so it matters more
/// than the message text.
pub fn unused_symbol_to_lsp(symbol: &UnusedSymbol) -> LspDiagnostic {
    LspDiagnostic {
        range: range_to_lsp(&symbol.range),
        severity: Some(LspSeverity::HINT),
        code: None,
        code_description: None,
        source: Some("islet".to_string()),
        message: format!("'{}' is declared but never used", symbol.name),
        related_information: None,
        tags: Some(vec![DiagnosticTag::UNNECESSARY]),
        data: None,
    }
}

/// Convert an islet-core Tooltip to an lsp-types Hover.
pub fn tooltip_to_hover(tooltip: &Tooltip) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value: tooltip.value.clone(),
        }),
        range: tooltip.range.as_ref().map(range_to_lsp),
    }
}

/// Convert an islet-core CompletionKind to an lsp-types CompletionItemKind.
pub fn completion_kind_to_lsp(kind: &CompletionKind) -> CompletionItemKind {
    match kind {
        CompletionKind::Text => CompletionItemKind::TEXT,
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Field => CompletionItemKind::FIELD,
        CompletionKind::Variable => CompletionItemKind::VARIABLE,
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Constant => CompletionItemKind::CONSTANT,
        CompletionKind::Struct => CompletionItemKind::STRUCT,
    }
}

/// Convert an islet-core CompletionItem to an lsp-types CompletionItem.
pub fn completion_to_lsp(item: &CompletionItem) -> LspCompletionItem {
    LspCompletionItem {
        label: item.label.clone(),
        kind: item.kind.as_ref().map(completion_kind_to_lsp),
        detail: item.detail.clone(),
        documentation: item.documentation.clone().map(|value| {
            Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            })
        }),
        ..Default::default()
    }
}

/// Convert an islet-core SignatureHelp to an lsp-types SignatureHelp.
pub fn signature_help_to_lsp(help: &SignatureHelp) -> LspSignatureHelp {
    LspSignatureHelp {
        signatures: help
            .signatures
            .iter()
            .map(|sig| SignatureInformation {
                label: sig.label.clone(),
                documentation: sig.documentation.clone().map(Documentation::String),
                parameters: Some(sig.parameters.iter().map(parameter_to_lsp).collect()),
                active_parameter: None,
            })
            .collect(),
        active_signature: Some(help.active_signature),
        active_parameter: Some(help.active_parameter),
    }
}

fn parameter_to_lsp(param: &ParameterInfo) -> ParameterInformation {
    ParameterInformation {
        label: ParameterLabel::Simple(param.label.clone()),
        documentation: param.documentation.clone().map(Documentation::String),
    }
}

/// Convert an islet-core SymbolKind to an lsp-types SymbolKind.
pub fn symbol_kind_to_lsp(kind: &SymbolKind) -> LspSymbolKind {
    match kind {
        SymbolKind::Field => LspSymbolKind::FIELD,
        SymbolKind::Function => LspSymbolKind::FUNCTION,
        SymbolKind::Variable => LspSymbolKind::VARIABLE,
        SymbolKind::Constant => LspSymbolKind::CONSTANT,
        SymbolKind::Struct => LspSymbolKind::STRUCT,
    }
}

/// Convert an islet-core SymbolInfo to an lsp-types DocumentSymbol.
pub fn symbol_to_lsp(symbol: &SymbolInfo) -> LspDocumentSymbol {
    #[allow(deprecated)]
    LspDocumentSymbol {
        name: symbol.name.clone(),
        detail: symbol.detail.clone(),
        kind: symbol_kind_to_lsp(&symbol.kind),
        tags: None,
        deprecated: None,
        range: range_to_lsp(&symbol.range),
        selection_range: range_to_lsp(&symbol.selection_range),
        // Fragment outlines are flat
        children: None,
    }
}

/// Convert a definition target to an lsp-types Location.
///
/// The compiler names sources by their compile-time name: a fragment id for
/// a span inside an open document, or a `file://` URI for an included file.
/// Fragment ids map back to their host document, whose coordinates the
/// projection already matches; anything else is parsed as a URI directly.
pub fn location_to_lsp(location: &Location, result: &BuildResult) -> Option<LspLocation> {
    let uri = match result.find_by_name(&location.source) {
        Some(fragment) => Url::parse(&fragment.uri).ok()?,
        None => Url::parse(&location.source).ok()?,
    };
    Some(LspLocation {
        uri,
        range: range_to_lsp(&location.range),
    })
}
