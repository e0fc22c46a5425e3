// Résumé vs. job description evaluation.
// Implements: prompt templates, PDF extraction, the two-provider flow,
// response normalization (fences, strict JSON, literal fallback) and rendering.
// All model calls go through llm_client, never a provider API directly.

pub mod display;
pub mod evaluator;
pub mod extract;
pub mod handlers;
pub mod literal;
pub mod normalizer;
pub mod prompts;
pub mod record;
