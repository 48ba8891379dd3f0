// Narrative and illustration prompt constants for the generation pipeline.
// Templates use {field} placeholders filled from the validated PromptSet.
// Each paragraph of the response becomes one page, so every template asks
// for short paragraphs separated by blank lines.

/// System role for children's story generation.
pub const CHILDREN_STORY_SYSTEM: &str = "You are a children's story writer.";

/// Children's story template.
/// Replace: {name}, {age}, {interests}, {favorite_characters}
pub const CHILDREN_STORY_TEMPLATE: &str = "\
Create a children's bedtime story for {name}, who is {age} years old. \
The story should be engaging and include elements about {interests}, \
featuring {favorite_characters}. \
Split the story into 5-7 pages, with each page being a short paragraph \
separated by a blank line. Make it magical and educational. \
Keep every page suitable for young children.";

/// System role for spouse roasting generation.
pub const SPOUSE_ROASTING_SYSTEM: &str = "You are a humorous writer.";

/// Spouse roasting template.
/// Replace: {name}, {interests}
pub const SPOUSE_ROASTING_TEMPLATE: &str = "\
Create a fun, light-hearted roasting book for {name}. \
Include references to {interests} and make it humorous but not mean-spirited. \
Split the story into 5-7 pages, with each page being a short paragraph \
separated by a blank line. Make it funny and personal.";

/// Illustration prompt wrapper. Replace: {page_text}
pub const ILLUSTRATION_TEMPLATE: &str = "\
Create a beautiful illustration for this text: {page_text} \
The illustration should be colorful, engaging, family-friendly, and \
suitable for a book page.";
