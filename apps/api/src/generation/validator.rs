//! Prompt Validator — checks a submitted PromptSet against a book type's
//! required fields. Side-effect-free.
//!
//! A field counts as missing when it is absent or blank after trimming.
//! Unknown extra fields are ignored, not an error, to tolerate client drift.

use crate::errors::AppError;
use crate::generation::book_type::BookTypeKind;
use crate::models::book::PromptSet;

/// Validates `prompt_set` for `kind`, failing with a `Validation` error that
/// names every missing field.
pub fn validate_prompt_set(kind: BookTypeKind, prompt_set: &PromptSet) -> Result<(), AppError> {
    let missing: Vec<&str> = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|field| prompt_set.get(field).is_none())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Missing required prompt field(s) for {}: {}",
            kind.slug(),
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_children_prompts() -> PromptSet {
        PromptSet::from([
            ("name", "Mia"),
            ("age", "5"),
            ("interests", "dinosaurs"),
            ("favorite_characters", "a brave triceratops"),
        ])
    }

    #[test]
    fn test_accepts_complete_prompt_set() {
        assert!(validate_prompt_set(BookTypeKind::ChildrenStory, &full_children_prompts()).is_ok());
    }

    #[test]
    fn test_rejects_missing_field() {
        let prompts = PromptSet::from([
            ("name", "Mia"),
            ("age", "5"),
            ("interests", "dinosaurs"),
        ]);
        let err = validate_prompt_set(BookTypeKind::ChildrenStory, &prompts).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("favorite_characters")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_blank_field_value() {
        let mut prompts = full_children_prompts();
        prompts.0.insert("age".to_string(), "   ".to_string());
        let err = validate_prompt_set(BookTypeKind::ChildrenStory, &prompts).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("age")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_ignores_unknown_extra_fields() {
        let mut prompts = full_children_prompts();
        prompts
            .0
            .insert("pet_name".to_string(), "Rex".to_string());
        assert!(validate_prompt_set(BookTypeKind::ChildrenStory, &prompts).is_ok());
    }

    #[test]
    fn test_names_every_missing_field() {
        let prompts = PromptSet::from([("name", "Mia")]);
        let err = validate_prompt_set(BookTypeKind::ChildrenStory, &prompts).unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("age"));
                assert!(msg.contains("interests"));
                assert!(msg.contains("favorite_characters"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_spouse_roasting_requires_only_its_fields() {
        let prompts = PromptSet::from([("name", "Sam"), ("interests", "golf")]);
        assert!(validate_prompt_set(BookTypeKind::SpouseRoasting, &prompts).is_ok());
    }
}
