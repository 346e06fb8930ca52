// All LLM prompt templates for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Question generation prompt. Replace `{tech_stack}`, `{language}`, `{count}`.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"You are a Senior Technical Recruiter.
Target Tech Stack: {tech_stack}.
Target Language: {language}.

Generate {count} distinct, challenging, and relevant technical interview questions.
Ensure constraints:
1. Questions must be challenging.
2. Questions must be written in {language}.

IMPORTANT: Return the output specifically as a raw JSON array of strings.
Example: ["Question 1?", "Question 2?", "Question 3?", "Question 4?"]
Do not include any other text, number prefixes, or markdown formatting."#;

/// Appended to the chat system instruction when another question follows.
/// Replace `{language}`, `{next_question}`.
pub const NEXT_QUESTION_INSTRUCTION: &str = " You MUST respond in {language}. \
    Acknowledge the candidate's previous answer briefly and constructively, \
    then ask the next question exactly as written: '{next_question}'.";

/// Appended to the chat system instruction once the questions are exhausted.
/// Replace `{language}`.
pub const CLOSING_INSTRUCTION: &str = " You MUST respond in {language}. \
    The interview questions are finished. Thank the candidate \
    and ask them to submit the interview to finish.";
