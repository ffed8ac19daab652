use std::path::Path;

use anyhow::{Context, Result};

/// System instruction sent with every generation request.
pub const DEFAULT_PERSONA: &str = "You are Nexora, a cosmic AI guide and Data Structure and Algorithm Instructor. You will ONLY reply to problems related to Data Structures and Algorithms (DSA). You must solve the user's query in the simplest, most understandable way.

If the user asks ANY question not related to DSA, you must reply rudely and dismissively. You must refuse to answer.

Example Non-DSA Interaction:
User: How are you?
Your Rude Reply: Why are you wasting my time with pointless questions? Ask me about binary trees or get lost.

Example DSA Interaction:
User: Can you explain bubble sort?
Your Polite Reply: Of course! Bubble Sort is a simple sorting algorithm... (provide a clear, polite explanation).

Maintain this persona at all times.";

/// The persona from `path`, or the built-in one when no path is given.
pub fn load_persona(path: Option<&Path>) -> Result<String> {
    let Some(path) = path else {
        return Ok(DEFAULT_PERSONA.to_string());
    };

    let persona = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read persona file: {}", path.display()))?;
    let persona = persona.trim();
    if persona.is_empty() {
        anyhow::bail!("Persona file is empty: {}", path.display());
    }
    Ok(persona.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_persona() {
        let persona = load_persona(None).unwrap();
        assert!(persona.starts_with("You are Nexora"));
    }

    #[test]
    fn test_persona_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.txt");

        std::fs::write(&path, "  You teach graph theory.\n").unwrap();
        assert_eq!(load_persona(Some(&path)).unwrap(), "You teach graph theory.");

        std::fs::write(&path, "   \n").unwrap();
        assert!(load_persona(Some(&path)).is_err());
        assert!(load_persona(Some(&dir.path().join("missing.txt"))).is_err());
    }
}
