// Shared prompt fragments. Each service that needs LLM calls defines its own
// prompts.rs alongside it; this file holds the cross-cutting pieces.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction appended to every prompt that evaluates a person.
pub const FAIRNESS_INSTRUCTION: &str = "\
    Judge only job-relevant evidence present in the provided text. \
    Ignore name, gender, age, nationality, photos and any other protected attribute. \
    Do NOT invent experience or skills that are not stated.";
