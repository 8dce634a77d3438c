// Shared prompt constants and prompt-building fragments.
// Each stage defines its own templates in pipeline::prompts.
// This file contains cross-cutting fragments.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing instruction appended to every stage prompt.
pub const JSON_ONLY_FOOTER: &str = "Respond with ONLY valid JSON, no markdown formatting.";
