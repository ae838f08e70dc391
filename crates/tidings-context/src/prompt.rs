// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt rendering for document-bound conversations.

use tidings_core::types::Passage;

/// Placeholder replaced by retrieved passages.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Text used when the document search returns nothing.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content.";

/// Fills `template` with the passages joined by blank lines.
pub fn render_document_prompt(template: &str, passages: &[Passage]) -> String {
    let context = if passages.is_empty() {
        NO_RELEVANT_CONTENT.to_string()
    } else {
        passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    template.replace(CONTEXT_PLACEHOLDER, &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_passages() {
        let prompt = render_document_prompt(
            "Only use:\n{context}",
            &[Passage::new("alpha"), Passage::new("beta")],
        );
        assert_eq!(prompt, "Only use:\nalpha\n\nbeta");
    }

    #[test]
    fn empty_search_uses_placeholder_text() {
        let prompt = render_document_prompt("Only use:\n{context}", &[]);
        assert_eq!(prompt, "Only use:\nNo relevant content.");
    }
}
