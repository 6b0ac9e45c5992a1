//! Fixed user-visible strings.
//!
//! Every failure the session can hit ends in one of these messages rather than
//! a raw error, so the table doubles as the list of user-facing outcomes.

use crate::config::Locale;

/// The localized strings shown in the context field and the document area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Messages {
    /// Replaces the context when the uploaded file type is not supported.
    pub unsupported_file: &'static str,
    /// Replaces the context when a PDF cannot be read.
    pub pdf_read_failed: &'static str,
    /// Replaces the context when a text file cannot be read.
    pub file_read_failed: &'static str,
    /// Shown in the document area when the response carries no text.
    pub empty_response: &'static str,
    /// Shown in the document area when the request fails.
    pub generation_failed: &'static str,
    /// Placeholder shown while the document area is empty.
    pub placeholder: &'static str,
}

const ES: Messages = Messages {
    unsupported_file: "Error: Tipo de archivo no soportado.",
    pdf_read_failed: "Error: No se pudo leer el archivo PDF.",
    file_read_failed: "Error: No se pudo leer el archivo.",
    empty_response:
        "Lo siento, no pude generar un documento. Por favor, intenta con otra solicitud.",
    generation_failed: "Ocurrió un error. Por favor, revisa la consola para más detalles.",
    placeholder: "Tu documento aparecerá aquí.",
};

const EN: Messages = Messages {
    unsupported_file: "Error: Unsupported file type.",
    pdf_read_failed: "Error: Could not read the PDF file.",
    file_read_failed: "Error: Could not read the file.",
    empty_response: "Sorry, I could not generate a document. Please try a different request.",
    generation_failed: "An error occurred. Please check the logs for details.",
    placeholder: "Your document will appear here.",
};

impl Messages {
    pub fn for_locale(locale: Locale) -> &'static Messages {
        match locale {
            Locale::Es => &ES,
            Locale::En => &EN,
        }
    }

    /// True when `text` is one of the context-field error strings of any locale.
    pub fn is_context_error(text: &str) -> bool {
        [ES, EN].iter().any(|m| {
            text == m.unsupported_file || text == m.pdf_read_failed || text == m.file_read_failed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locales_differ() {
        assert_ne!(
            Messages::for_locale(Locale::Es).empty_response,
            Messages::for_locale(Locale::En).empty_response
        );
    }

    #[test]
    fn context_errors_are_recognised() {
        assert!(Messages::is_context_error("Error: Tipo de archivo no soportado."));
        assert!(Messages::is_context_error("Error: Could not read the PDF file."));
        assert!(!Messages::is_context_error("plain context"));
    }
}
