//! Error taxonomy for the gazette subsystem.
//!
//! The transport client and the document codec return these errors; the
//! directory wraps them, and the tool façade converts every one of them into
//! a failure envelope. Nothing in this module ever reaches the LLM loop as a
//! raw error: [`ToolError`]'s `Display` is the user-facing message.

/// Outbound request failures (connection, TLS, timeout, non-2xx status).
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The upstream answered with a status outside `[200, 300)`.
    #[error("HTTP {status} ao acessar {url}")]
    Status { status: u16, url: String },

    /// The request did not complete within the configured timeout.
    #[error("tempo esgotado ao acessar {url}")]
    Timeout { url: String },

    /// DNS, connect, TLS or body read failure.
    #[error("falha de rede ao acessar {url}: {message}")]
    Request { url: String, message: String },

    /// The URL or a header value could not be built.
    #[error("requisição inválida: {0}")]
    InvalidRequest(String),
}

/// Failures while querying the gazette listing.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The listing body was not the expected `{ "data": [...] }` JSON.
    #[error("Resposta inválida do servidor de diários oficiais")]
    InvalidResponse(#[source] serde_json::Error),

    /// The configured base URL could not be combined with the endpoint path.
    #[error("URL base inválida: {0}")]
    InvalidBaseUrl(String),
}

/// PDF text extraction failure.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("o arquivo baixado não é um PDF")]
    NotPdf,

    #[error("falha ao extrair texto do PDF: {0}")]
    Pdf(String),
}

/// Everything a tool operation can fail with, rendered in Portuguese.
///
/// The `Display` text never includes the wrapped error: status codes, URLs
/// and client error text stay in the `source()` chain for logging.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Não foi possível buscar os diários oficiais.")]
    Directory(#[from] DirectoryError),

    #[error("Não foi possível ler o conteúdo do diário oficial.")]
    Fetch(#[source] NetworkError),

    #[error("Não foi possível ler o conteúdo do diário oficial.")]
    Decode(#[from] DecodeError),

    /// No gazette matched the resolution query.
    #[error("{0}")]
    NotFound(String),

    /// A required argument was empty after trimming.
    #[error("{0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_code_and_url() {
        let err = NetworkError::Status {
            status: 500,
            url: "https://example.test/x".into(),
        };
        assert_eq!(err.to_string(), "HTTP 500 ao acessar https://example.test/x");
    }

    #[test]
    fn directory_network_error_is_transparent() {
        let err: DirectoryError = NetworkError::Timeout {
            url: "https://example.test".into(),
        }
        .into();
        assert!(err.to_string().starts_with("tempo esgotado"));
    }

    #[test]
    fn tool_error_hides_directory_detail() {
        let err: ToolError = DirectoryError::InvalidBaseUrl("nope".into()).into();
        assert_eq!(err.to_string(), "Não foi possível buscar os diários oficiais.");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("nope"));
    }

    #[test]
    fn tool_error_hides_status_and_url() {
        let err = ToolError::Fetch(NetworkError::Status {
            status: 503,
            url: "https://example.test/download_edicao/x.pdf".into(),
        });
        let msg = err.to_string();
        assert_eq!(msg, "Não foi possível ler o conteúdo do diário oficial.");
        assert!(!msg.contains("503"));
        assert!(!msg.contains("https://"));
    }

    #[test]
    fn tool_error_hides_decoder_text() {
        let err: ToolError = DecodeError::Pdf("invalid xref table".into()).into();
        assert!(!err.to_string().contains("xref"));
    }
}
