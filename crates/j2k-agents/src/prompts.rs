//! Prompts for the translation model

/// System prompt instructing the model to emit code after `sentinel`.
pub fn system_prompt(sentinel: &str) -> String {
    format!(
        r#"Translate the given Java code to Kotlin.
Return only the translated Kotlin code, no extra comments.
Return the code text after the following sentinel token, written exactly as {sentinel}.
After {sentinel}, output *only valid Kotlin source code*; do not add any labels or explanations.

Keep the translation faithful:
- Keep every import except java.util collection imports that Kotlin provides built in. Never use wildcard imports.
- Java classes are open for extension unless declared final or abstract. Mark such classes `open`.
- Java collections are mutable. Use MutableList, MutableSet and MutableMap where the Java code used List, Set and Map."#
    )
}

pub fn user_prompt(java_source: &str) -> String {
    format!("Java source code we want to translate.\n{java_source}")
}
