//! JSON extraction from model responses.
//!
//! Model output is prose that embeds one JSON object, sometimes inside a
//! fenced code block. Callers decide what a missing object means; here it is
//! just `None`.

/// Extract the first JSON object from a response.
///
/// Tries a ```json fenced block first, then falls back to the first balanced
/// `{...}` substring.
pub fn extract_json(content: &str) -> Option<String> {
    // Try to find JSON in code blocks first
    if let Some(start) = content.find("```json") {
        let start = start + 7;
        if let Some(end) = content[start..].find("```") {
            return Some(content[start..start + end].trim().to_string());
        }
    }

    // Try to find raw JSON
    if let Some(start) = content.find('{') {
        // Find matching closing brace
        let mut depth = 0;
        let mut end = start;
        for (i, c) in content[start..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth == 0 {
            return Some(content[start..end].to_string());
        }
    }

    None
}
