use crate::ai::client::ChatMessage;
use crate::difficulty::{focus_for, prompt_instructions};
use crate::models::{DifficultyTier, SlideContentRecord};

/// System and user messages asking for one question at `tier` from `slide`.
pub fn build_question_prompt(slide: &SlideContentRecord, tier: DifficultyTier) -> Vec<ChatMessage> {
    let focus = focus_for(tier);

    let system = format!(
        r#"You are an expert writer of assessment questions for educational content. Generate exactly one question that checks student understanding of the slide provided.

{}
## Focus areas
{}

## Example question patterns
{}

## Question types
Use one of: multiple_choice (4 options), single_choice (2 options), essay, short_answer.
For choice questions include plausible distractors, and the correct answer must be one of the choices word for word.

## Output
Respond ONLY with a single valid JSON object, no prose, with these fields:
- question: the question text
- question_type: one of multiple_choice, single_choice, essay, short_answer
- difficulty: {}
- choices: array of choice strings for multiple_choice/single_choice; null for essay and short_answer
- correct_answer: the correct answer
- explanation: a detailed explanation of the answer
- keywords: array of related keywords

For non-choice questions, choices must be null.
"#,
        prompt_instructions(tier),
        bullet_list(&focus.focus_areas),
        bullet_list(&focus.question_patterns),
        tier.as_str(),
    );

    let user = format!(
        r#"## Slide information
- Slide number: {}
- Title: {}
- Content: {}
- Bullet points: {}
- Full text: {}

Generate one question from the content above."#,
        slide.slide_number,
        slide.title,
        slide.content,
        slide.bullet_points.join(", "),
        slide.full_text,
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}
