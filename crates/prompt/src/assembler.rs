//! Context assembly.
//!
//! Turns retrieved document evidence and external results into a bounded,
//! deterministically ordered context block and the final prompt.
//!
//! The budget is measured in characters and covers the context block plus the
//! query text; fixed template wording is not counted. When the budget is
//! exceeded, whole entries are dropped from the end: external entries first,
//! then trailing document entries. Only a query that alone exceeds the budget
//! is ever cut, and then all evidence is dropped.

use crate::builder::PromptTemplate;
use crate::types::{AssembledContext, ContextEntry, ContextSection, Provenance};
use localai_core::AppResult;
use unicode_segmentation::UnicodeSegmentation;

/// Longest excerpt rendered for a single entry.
const MAX_DETAIL_CHARS: usize = 300;

/// Assemble the context and render the final prompt.
///
/// Given identical inputs the output is byte-identical.
pub fn assemble(
    template: &PromptTemplate,
    query: &str,
    documents: &[ContextEntry],
    external: &[ContextEntry],
    budget: usize,
) -> AppResult<AssembledContext> {
    let query_len = query.chars().count();

    let (query_text, query_truncated) = if query_len > budget {
        tracing::warn!(
            "Query is {} characters, over the {} character budget; truncating",
            query_len,
            budget
        );
        (truncate_graphemes(query, budget), true)
    } else {
        (query.to_string(), false)
    };

    let remaining = budget.saturating_sub(query_text.chars().count());

    let mut doc_count = if query_truncated { 0 } else { documents.len() };
    let mut ext_count = if query_truncated { 0 } else { external.len() };

    let mut sections = render_sections(&documents[..doc_count], &external[..ext_count]);
    while context_len(&sections) > remaining {
        if ext_count > 0 {
            ext_count -= 1;
        } else if doc_count > 0 {
            doc_count -= 1;
        } else {
            break;
        }
        sections = render_sections(&documents[..doc_count], &external[..ext_count]);
    }

    let dropped_documents = documents.len() - doc_count;
    let dropped_external = external.len() - ext_count;
    if dropped_documents + dropped_external > 0 && !query_truncated {
        tracing::debug!(
            "Context budget {} reached: dropped {} document and {} external entries",
            budget,
            dropped_documents,
            dropped_external
        );
    }

    let context = join_sections(&sections);
    let prompt = template.render(&context, &query_text)?;

    Ok(AssembledContext {
        sections,
        context,
        query: query_text,
        prompt,
        dropped_documents,
        dropped_external,
        query_truncated,
    })
}

/// Render the non-empty sections in priority order.
fn render_sections(documents: &[ContextEntry], external: &[ContextEntry]) -> Vec<ContextSection> {
    let mut sections = Vec::with_capacity(2);
    if !documents.is_empty() {
        sections.push(render_section(Provenance::Document, documents));
    }
    if !external.is_empty() {
        sections.push(render_section(Provenance::External, external));
    }
    sections
}

fn render_section(provenance: Provenance, entries: &[ContextEntry]) -> ContextSection {
    let mut text = String::new();
    text.push_str(provenance.heading());
    text.push('\n');

    for entry in entries {
        text.push_str("- ");
        text.push_str(&single_line(&entry.title));
        if let Some(detail) = entry.detail.as_deref() {
            let detail = single_line(detail);
            if !detail.is_empty() {
                text.push_str(": ");
                text.push_str(&truncate_snippet(&detail, MAX_DETAIL_CHARS));
            }
        }
        text.push('\n');
    }

    ContextSection {
        provenance,
        text,
        entries: entries.len(),
    }
}

/// Sections are separated by a blank line.
fn join_sections(sections: &[ContextSection]) -> String {
    sections
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn context_len(sections: &[ContextSection]) -> usize {
    let separators = sections.len().saturating_sub(1);
    sections.iter().map(|s| s.text.chars().count()).sum::<usize>() + separators
}

/// Collapse all whitespace runs (including newlines) into single spaces.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, preferring a word boundary.
fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = truncate_graphemes(text, max_chars.saturating_sub(3));
    let trimmed = match cut.rfind(char::is_whitespace) {
        Some(last_space) if last_space > 0 => &cut[..last_space],
        _ => cut.as_str(),
    };
    format!("{}...", trimmed)
}

/// Longest prefix of whole grapheme clusters within `max_chars` characters.
fn truncate_graphemes(text: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let len = grapheme.chars().count();
        if used + len > max_chars {
            break;
        }
        out.push_str(grapheme);
        used += len;
    }
    out
}
