//! Prompt construction for the gap analysis request.

/// Fixed system instruction sent with every analysis request.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert Research Scientist.

Task: Analyze the provided text/abstracts from multiple academic papers.
1. Synthesize the core contributions.
2. Identify the "Research Gap" (conflicts or missing links).
3. Generate a novel research proposal to bridge this gap.
4. Create a Mermaid.js flowchart string visualizing the methodology.

You must output valid JSON only.

For the mermaidCode:
- Use 'graph TD'
- IMPORTANT: You MUST wrap all node labels in double quotes.
  Example: A["Step 1 (Initial)"]
- Do NOT wrap the mermaid code in markdown code blocks."#;

/// Literal description of the JSON shape the model must return.
pub const RESPONSE_SHAPE: &str = r#"{
  "gapAnalysis": "one sentence summary",
  "proposal": {
    "title": "string",
    "abstract": "string",
    "methodology": "string"
  },
  "mermaidCode": "graph TD..."
}"#;

/// The two text parts of an analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Build the system and user instructions for one request.
pub fn build_prompt(topic: &str, abstracts: &str) -> Prompt {
    let user = format!(
        "Research Topic: {topic}\n\n\
         Additional Abstracts/Notes:\n{abstracts}\n\n\
         Analyze the attached files and text. Return JSON following this structure:\n\
         {RESPONSE_SHAPE}"
    );
    Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}
