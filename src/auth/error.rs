use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The merged flag/environment credential set cannot produce any auth
    /// method. This is the "environment not set up" case the entry point
    /// catches to print a friendly message instead of a trace.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    #[error("failed to read TLS file {path}: {source}")]
    TlsFile {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid TLS material in {path}: {source}")]
    TlsMaterial {
        path: String,
        source: reqwest::Error,
    },

    #[error("authentication rejected by {url}")]
    Unauthorized { url: String },

    #[error("identity service error ({status}): {body}")]
    IdentityError { status: u16, body: String },

    #[error("identity service returned no subject token")]
    MissingSubjectToken,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
pub(crate) const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Truncate a response body to avoid dumping excessive data. The cut is
/// walked back to a char boundary: localized server error text must not
/// split a multibyte character.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut cut = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..cut],
        body.len()
    )
}

impl AuthError {
    pub fn from_status(url: &str, status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => AuthError::Unauthorized {
                url: url.to_string(),
            },
            code => AuthError::IdentityError {
                status: code,
                body: truncate_body(body),
            },
        }
    }

    /// True for the failure mode that means "nothing is configured", as
    /// opposed to configured-but-rejected credentials.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, AuthError::MissingCredentials(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_pass_through_untruncated() {
        let body = "quota exceeded";
        assert_eq!(truncate_body(body), body);
    }

    #[test]
    fn long_bodies_are_cut_with_a_size_note() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 100);
        let cut = truncate_body(&body);
        assert!(cut.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(cut.ends_with(&format!("(truncated, {} total bytes)", body.len())));
    }

    #[test]
    fn truncation_never_splits_a_multibyte_character() {
        // 'é' is two bytes and straddles the truncation offset.
        let mut body = "a".repeat(MAX_ERROR_BODY_LENGTH - 1);
        body.push('é');
        body.push_str(&"b".repeat(50));

        let err = AuthError::from_status(
            "http://keystone.example.com/v3/auth/tokens",
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            &body,
        );
        match err {
            AuthError::IdentityError { status, body } => {
                assert_eq!(status, 500);
                // The straddling character is dropped whole.
                assert!(body.starts_with(&"a".repeat(MAX_ERROR_BODY_LENGTH - 1)));
                assert!(!body.contains('é'));
                assert!(body.contains("truncated"));
            }
            other => panic!("expected IdentityError, got {:?}", other),
        }
    }

    #[test]
    fn status_401_maps_to_unauthorized() {
        let err = AuthError::from_status(
            "http://keystone.example.com/v3/auth/tokens",
            reqwest::StatusCode::UNAUTHORIZED,
            "denied",
        );
        assert!(matches!(err, AuthError::Unauthorized { .. }));
    }
}
