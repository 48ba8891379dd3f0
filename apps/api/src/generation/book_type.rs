//! Book types — the closed set of purchasable templates.
//!
//! Each variant owns its display metadata, required prompt fields, and
//! narrative templates. Adding a book type is a variant addition here plus a
//! template in `prompts.rs`; there is no data-driven lookup and no
//! conditional chain anywhere else in the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::prompts;
use crate::models::book::PromptSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookTypeKind {
    ChildrenStory,
    SpouseRoasting,
}

/// All known kinds, in catalog listing order.
pub const ALL_KINDS: &[BookTypeKind] = &[BookTypeKind::ChildrenStory, BookTypeKind::SpouseRoasting];

impl BookTypeKind {
    pub fn slug(&self) -> &'static str {
        match self {
            BookTypeKind::ChildrenStory => "children-story",
            BookTypeKind::SpouseRoasting => "spouse-roasting",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BookTypeKind::ChildrenStory => "Children's Bedtime Story",
            BookTypeKind::SpouseRoasting => "Spouse Roasting Book",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BookTypeKind::ChildrenStory => {
                "Create a personalized bedtime story for your child"
            }
            BookTypeKind::SpouseRoasting => {
                "Create a fun, personalized roasting book for your significant other"
            }
        }
    }

    /// Prompt fields the user must supply for this kind.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            BookTypeKind::ChildrenStory => {
                &["name", "age", "interests", "favorite_characters"]
            }
            BookTypeKind::SpouseRoasting => &["name", "interests"],
        }
    }

    /// System role for the narrative generation call.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            BookTypeKind::ChildrenStory => prompts::CHILDREN_STORY_SYSTEM,
            BookTypeKind::SpouseRoasting => prompts::SPOUSE_ROASTING_SYSTEM,
        }
    }

    /// Fills this kind's narrative template with the validated prompt values.
    ///
    /// Callers must validate the PromptSet first; missing fields substitute
    /// as empty strings rather than panicking.
    pub fn narrative_prompt(&self, prompt_set: &PromptSet) -> String {
        let template = match self {
            BookTypeKind::ChildrenStory => prompts::CHILDREN_STORY_TEMPLATE,
            BookTypeKind::SpouseRoasting => prompts::SPOUSE_ROASTING_TEMPLATE,
        };

        let mut filled = template.to_string();
        for field in self.required_fields() {
            filled = filled.replace(
                &format!("{{{field}}}"),
                prompt_set.get(field).unwrap_or(""),
            );
        }
        filled
    }
}

impl fmt::Display for BookTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for BookTypeKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_KINDS
            .iter()
            .copied()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| AppError::UnknownBookType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trips() {
        for kind in ALL_KINDS {
            assert_eq!(kind.slug().parse::<BookTypeKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_slug_is_rejected() {
        let err = "poetry-anthology".parse::<BookTypeKind>().unwrap_err();
        assert!(matches!(err, AppError::UnknownBookType(_)));
    }

    #[test]
    fn test_children_story_required_fields() {
        assert_eq!(
            BookTypeKind::ChildrenStory.required_fields(),
            &["name", "age", "interests", "favorite_characters"]
        );
    }

    #[test]
    fn test_narrative_prompt_substitutes_all_fields() {
        let prompts = PromptSet::from([
            ("name", "Mia"),
            ("age", "5"),
            ("interests", "dinosaurs"),
            ("favorite_characters", "a brave triceratops"),
        ]);
        let filled = BookTypeKind::ChildrenStory.narrative_prompt(&prompts);
        assert!(filled.contains("Mia"));
        assert!(filled.contains("dinosaurs"));
        assert!(filled.contains("a brave triceratops"));
        assert!(!filled.contains('{'), "no unreplaced placeholders: {filled}");
    }

    #[test]
    fn test_serde_uses_kebab_case_slugs() {
        let json = serde_json::to_string(&BookTypeKind::SpouseRoasting).unwrap();
        assert_eq!(json, "\"spouse-roasting\"");
        let back: BookTypeKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BookTypeKind::SpouseRoasting);
    }
}
