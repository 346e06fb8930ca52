// Shared prompt fragments used by more than one generation prompt.
// Generation-specific templates live in generation/prompts.rs.

/// Persona line that opens every chat-turn system instruction.
pub const RECRUITER_PERSONA: &str = "You are a technical recruiting assistant screening a candidate.";

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a helpful hiring assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";
