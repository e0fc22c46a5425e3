// Cross-cutting prompt fragments shared by every model call.
// Task-specific templates live in evaluation::prompts.

/// System message sent with every OpenAI request.
pub const ATS_EVALUATOR_SYSTEM: &str = "You are an expert ATS evaluation system for tech resumes.";
