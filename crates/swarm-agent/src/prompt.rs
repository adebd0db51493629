/// Assemble the task prompt handed to a worker.
///
/// Sections appear in a fixed order: `# Task`, `# Relevant Files` (only when
/// hints are given), `# Additional Context` (only when non-empty) and
/// `# Output Requirements`.
pub fn build_prompt(
    task: &str,
    context_files: &[String],
    additional_context: Option<&str>,
    output_format: &str,
) -> String {
    let mut prompt = format!("# Task\n\n{task}\n");

    if !context_files.is_empty() {
        prompt.push_str("\n# Relevant Files\n\n");
        for file in context_files {
            prompt.push_str(&format!("- `{file}`\n"));
        }
    }

    if let Some(context) = additional_context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str(&format!("\n# Additional Context\n\n{context}\n"));
    }

    prompt.push_str(&format!("\n# Output Requirements\n\n{output_format}\n"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_prompt() {
        let prompt = build_prompt("Add a limiter", &[], None, "FORMAT");
        assert_eq!(
            prompt,
            "# Task\n\nAdd a limiter\n\n# Output Requirements\n\nFORMAT\n"
        );
    }

    #[test]
    fn test_full_prompt_section_order() {
        let files = vec!["src/limiter.go".to_string(), "go.mod".to_string()];
        let prompt = build_prompt(
            "Add a limiter",
            &files,
            Some("## Recent Activity\n[CODER] ✓"),
            "FORMAT",
        );
        let task = prompt.find("# Task").unwrap();
        let relevant = prompt.find("# Relevant Files").unwrap();
        let extra = prompt.find("# Additional Context").unwrap();
        let output = prompt.find("# Output Requirements").unwrap();
        assert!(task < relevant && relevant < extra && extra < output);
        assert!(prompt.contains("- `src/limiter.go`\n- `go.mod`\n"));
        assert!(prompt.contains("## Recent Activity\n[CODER] ✓"));
    }

    #[test]
    fn test_blank_context_is_omitted() {
        let prompt = build_prompt("x", &[], Some("   "), "FORMAT");
        assert!(!prompt.contains("# Additional Context"));
    }
}
