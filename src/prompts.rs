//! Prompt composition for document generation.
//!
//! Every prompt fragment lives here. [`compose_prompt`] is pure: the same
//! instruction, context and locale always give the same request text.

use crate::config::Locale;

/// Language tag of the fenced blocks the model is asked to use for diagrams.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// Fixed formatting directives appended to every instruction.
pub fn formatting_directives(locale: Locale) -> &'static str {
    match locale {
        Locale::Es => {
            "Formatea el documento utilizando las reglas de APA v7. Si se solicitan diagramas \
(clases, paquetes, etc.), usa el formato de Mermaid (envuelto en ```mermaid ... ```). \
Para las tablas, usa el formato estándar de Markdown."
        }
        Locale::En => {
            "Format the document following APA v7 rules. If diagrams are requested \
(classes, packages, etc.), use Mermaid syntax (wrapped in ```mermaid ... ```). \
For tables, use standard Markdown table syntax."
        }
    }
}

/// Wrap the raw instruction in the document request and the formatting directives.
pub fn instruction_block(instruction: &str, locale: Locale) -> String {
    let lead = match locale {
        Locale::Es => {
            "Por favor, genera un documento del modelo de dominio del proyecto siguiendo estas instrucciones:"
        }
        Locale::En => {
            "Please generate a domain model document for the project following these instructions:"
        }
    };
    format!(
        "{lead}\n\n{instruction}\n\n{}",
        formatting_directives(locale)
    )
}

/// Build the final request text from the instruction and the optional context.
///
/// When `context` is non-empty it is embedded verbatim in a preamble that
/// precedes the instruction block; otherwise the instruction block is sent alone.
pub fn compose_prompt(instruction: &str, context: &str, locale: Locale) -> String {
    let block = instruction_block(instruction, locale);
    if context.is_empty() {
        return block;
    }
    match locale {
        Locale::Es => format!(
            "Usando el siguiente documento como contexto:\n\n{context}\n\n\
Basado en este contexto, por favor, completa la siguiente tarea:\n\n{block}"
        ),
        Locale::En => format!(
            "Using the following document as context:\n\n{context}\n\n\
Based on this context, please complete the following task:\n\n{block}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_present_without_context() {
        let p = compose_prompt("Summarize X", "", Locale::Es);
        assert!(p.contains(formatting_directives(Locale::Es)));
        assert!(p.contains("Summarize X"));
        assert!(!p.contains("contexto:"));
    }

    #[test]
    fn no_context_is_exactly_the_instruction_block() {
        let p = compose_prompt("Summarize X", "", Locale::En);
        assert_eq!(p, instruction_block("Summarize X", Locale::En));
    }

    #[test]
    fn directives_present_with_context() {
        let p = compose_prompt("Summarize X", "Some background", Locale::En);
        assert!(p.contains(formatting_directives(Locale::En)));
    }

    #[test]
    fn context_precedes_instruction() {
        let ctx = "Line one\nLine two of the uploaded context";
        let p = compose_prompt("Draw the class diagram", ctx, Locale::Es);
        let ctx_at = p.find(ctx).expect("context embedded verbatim");
        let instr_at = p.find("Draw the class diagram").expect("instruction present");
        assert!(ctx_at < instr_at);
    }

    #[test]
    fn directives_mention_diagram_fence() {
        for locale in [Locale::Es, Locale::En] {
            assert!(formatting_directives(locale).contains(&format!("```{DIAGRAM_LANGUAGE}")));
        }
    }
}
