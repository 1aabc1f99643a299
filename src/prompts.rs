use schemars::{schema_for, JsonSchema};

pub const MCQ_PROMPT_TEMPLATE: &str = "Generate a {difficulty} multiple-choice question about {topic}.

Return ONLY a JSON object with these exact fields:
- 'question': A clear, specific question
- 'options': An array of exactly 4 possible answers
- 'correct_answer': One of the options that is the correct answer

Example format:
{
    \"question\": \"What is the capital of France?\",
    \"options\": [\"London\", \"Berlin\", \"Paris\", \"Madrid\"],
    \"correct_answer\": \"Paris\"
}

Your response:";

pub const FILL_BLANK_PROMPT_TEMPLATE: &str = "Generate a {difficulty} fill-in-the-blank question about {topic}.

Return ONLY a JSON object with these exact fields:
- 'question': A sentence with '_____' marking where the blank should be
- 'correct_answer': The correct word or phrase that belongs in the blank

Example format:
{
    \"question\": \"The capital of France is _____.\",
    \"correct_answer\": \"Paris\"
}

Your response:";

/// Substitute `{topic}` and `{difficulty}` in a template.
///
/// Single pass over the template: placeholder text inside the substituted
/// values is left alone.
pub fn format_prompt(template: &str, topic: &str, difficulty: &str) -> String {
    let mut out = String::with_capacity(template.len() + topic.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{topic}") {
            out.push_str(topic);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{difficulty}") {
            out.push_str(difficulty);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Ask the model not to repeat questions already accepted in this quiz.
pub fn add_avoid_list(prompt: String, previous: &[String]) -> String {
    if previous.is_empty() {
        return prompt;
    }
    let listed: Vec<String> = previous.iter().map(|q| format!("- {q}")).collect();
    format!(
        "{}\n\nDo not repeat or rephrase any of these questions:\n{}",
        prompt,
        listed.join("\n")
    )
}

/// Append JSON schema guidance for `T` to a prompt
pub fn add_schema_guidance<T: JsonSchema>(prompt: String) -> String {
    let schema = schema_for!(T);
    let schema_json = serde_json::to_string_pretty(&schema)
        .unwrap_or_else(|_| "Schema serialization failed".to_string());

    format!(
        "{}\n\n## Response Format\nRespond with valid JSON matching this schema:\n```json\n{}\n```",
        prompt, schema_json
    )
}
