//! Human-readable rendering of responses, catalogs, and errors for the terminal.

use std::fmt::Write as _;

use crate::error::StraicoError;
use crate::types::{Annotation, ChatResponse, Completion, CostSummary, ModelCatalog, ModelEntry};

const RULE_WIDTH: usize = 60;
const JUSTIFICATION_LIMIT: usize = 500;

fn number_or_na(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |number| number.to_string())
}

fn coins_or_na(entry: &ModelEntry) -> String {
    number_or_na(entry.coins())
}

/// Renders a chat response.
///
/// With `response_only`, price, word count, and selector justification are omitted.
///
/// # Errors
///
/// Returns [`StraicoError::Parse`] when the response holds no completion.
pub fn format_response(
    response: &ChatResponse,
    response_only: bool,
) -> Result<String, StraicoError> {
    let completions = response.completions()?;
    let cost = response.cost();
    if response.is_multi() {
        Ok(format_multi(&completions, cost, response.justification(), response_only))
    } else {
        let completion = completions
            .first()
            .ok_or_else(|| StraicoError::parse("no completion found in response"))?;
        Ok(format_single(completion, cost, response.justification(), response_only))
    }
}

fn format_single(
    completion: &Completion,
    cost: CostSummary,
    justification: Option<&str>,
    response_only: bool,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🤖 Model: {}", completion.model);
    if !response_only {
        let _ = writeln!(
            out,
            "💰 Price: {} coins | Words: {}",
            number_or_na(cost.price),
            number_or_na(cost.words)
        );
        if let Some(justification) = justification {
            let _ = writeln!(out, "📋 Justification: {}", truncate(justification));
        }
    }
    let _ = writeln!(out, "\n{}", completion.text.as_deref().unwrap_or("No response"));
    out.push_str(&format_sources(&completion.annotations));
    out
}

fn format_multi(
    completions: &[Completion],
    cost: CostSummary,
    justification: Option<&str>,
    response_only: bool,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    for (idx, completion) in completions.iter().enumerate() {
        if idx > 0 {
            let _ = writeln!(out, "\n{rule}");
        }
        let _ = writeln!(out, "\n🤖 Model {}: {}", idx + 1, completion.model);
        let _ = writeln!(out, "\n{}", completion.text.as_deref().unwrap_or("No response"));
        out.push_str(&format_sources(&completion.annotations));
    }
    if !response_only {
        let _ = writeln!(out, "\n{rule}");
        let _ = writeln!(
            out,
            "💰 Total Price: {} coins | Total Words: {}",
            number_or_na(cost.price),
            number_or_na(cost.words)
        );
        if let Some(justification) = justification {
            let _ = writeln!(out, "\n📋 Model Selection Justification:\n{justification}");
        }
    }
    out
}

fn truncate(text: &str) -> String {
    if text.chars().count() > JUSTIFICATION_LIMIT {
        let cut: String = text.chars().take(JUSTIFICATION_LIMIT).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

fn format_sources(annotations: &[Annotation]) -> String {
    if annotations.is_empty() {
        return String::new();
    }
    let mut out = format!("\n{}\n📚 Sources:\n\n", "─".repeat(RULE_WIDTH));
    for (idx, annotation) in annotations.iter().enumerate() {
        match annotation {
            Annotation::UrlCitation { url, .. } => {
                let _ = writeln!(out, "[{}] {url}", idx + 1);
            }
            Annotation::Other { kind, raw } => {
                let _ = writeln!(out, "[{}] {kind}: {raw}", idx + 1);
            }
        }
    }
    out
}

/// Renders "did you mean" suggestions for an unknown model.
pub fn format_suggestions(suggestions: &[ModelEntry]) -> String {
    let Some(first) = suggestions.first() else {
        return "💡 Use --list-models to see all available models".to_string();
    };
    let mut out = String::from("💡 Did you mean one of these models?\n\n");
    for (idx, entry) in suggestions.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", idx + 1, entry.display_name());
        let _ = writeln!(out, "   ID: {}", entry.model);
        let _ = writeln!(out, "   Cost: {} coins per 100 words\n", coins_or_na(entry));
    }
    let _ = writeln!(out, "💬 Use: --model \"MODEL_ID\" to select a specific model");
    let _ = write!(out, "   Example: --model \"{}\"", first.model);
    out
}

/// Renders the catalog as one block per model.
pub fn format_catalog(catalog: &ModelCatalog) -> String {
    let mut out = format!("\n✅ Found {} chat models:\n\n", catalog.len());
    for entry in &catalog.chat {
        let _ = writeln!(out, "  • {}", entry.display_name());
        let _ = writeln!(out, "    ID: {}", entry.model);
        let _ = writeln!(out, "    Cost: {} coins per 100 words\n", coins_or_na(entry));
    }
    out
}

/// Renders an error for the user.
///
/// Every kind fits one headline; unknown-model failures add their suggestion block. With
/// `verbose`, the debug representation is appended.
pub fn format_error(err: &StraicoError, verbose: bool) -> String {
    let headline = match err {
        StraicoError::Config { reason, .. } => format!("❌ Configuration error: {reason}"),
        StraicoError::Validation { message } => format!("❌ Invalid request: {message}"),
        StraicoError::Api {
            status, message, ..
        } => format!("❌ Error: {message} (HTTP {status})"),
        StraicoError::Parse { message } => format!("❌ Unexpected response: {message}"),
        StraicoError::Transport { message } => format!("❌ Network error: {message}"),
        StraicoError::Io(source) => format!("❌ I/O error: {source}"),
        StraicoError::Interrupted => "❌ Interrupted".to_string(),
    };

    let mut out = headline;
    if err.is_model_not_found() {
        out.push_str("\n\n");
        out.push_str(&format_suggestions(err.suggestions()));
    }
    if verbose {
        let _ = write!(out, "\n\n[debug] {err:?}");
    }
    out
}
