//! Narrative Generator — one text-generation call per book, split into pages.
//!
//! The page delimiter is a fixed double line break: each non-empty paragraph
//! of the response becomes one page, in order.

use tracing::warn;

use crate::errors::AppError;
use crate::generation::book_type::BookTypeKind;
use crate::llm_client::TextGenerator;
use crate::models::book::PromptSet;

/// Paragraph delimiter separating pages in the generated narrative.
pub const PAGE_DELIMITER: &str = "\n\n";

/// Page counts below this are suspicious for a storybook; logged, not rejected.
const EXPECTED_MIN_PAGES: usize = 3;

/// Generates the ordered page texts for a book.
///
/// Fails with `Generation` if the external call errors or the response
/// contains no non-empty paragraphs. No retries here; callers may retry.
pub async fn generate_narrative(
    text_gen: &dyn TextGenerator,
    kind: BookTypeKind,
    prompt_set: &PromptSet,
) -> Result<Vec<String>, AppError> {
    let prompt = kind.narrative_prompt(prompt_set);

    let story = text_gen
        .generate(kind.system_prompt(), &prompt)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    let pages = split_into_pages(&story);
    if pages.is_empty() {
        return Err(AppError::Generation(
            "narrative response contained no paragraphs".to_string(),
        ));
    }

    if pages.len() < EXPECTED_MIN_PAGES {
        warn!(
            "Narrative for {} produced only {} page(s); expected at least {}",
            kind.slug(),
            pages.len(),
            EXPECTED_MIN_PAGES
        );
    }

    Ok(pages)
}

/// Splits a narrative on the page delimiter, trimming each paragraph and
/// dropping empty ones.
pub fn split_into_pages(story: &str) -> Vec<String> {
    story
        .split(PAGE_DELIMITER)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
