use thiserror::Error;

/// Errors that fail a whole NFe document.
///
/// Everything else (missing optional elements, unparseable numbers, absent
/// lot annotations) is recovered locally as an empty or zero value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum NfeError {
    /// The input is not well-formed XML.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// The invoice root (`NFe`) or its `infNFe` block is absent.
    #[error("missing required section: {0}")]
    MissingRequiredSection(String),
}

impl NfeError {
    /// Short machine-friendly kind, handy for batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            NfeError::MalformedDocument(_) => "malformed_document",
            NfeError::MissingRequiredSection(_) => "missing_required_section",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = NfeError::MissingRequiredSection("infNFe".into());
        assert_eq!(err.to_string(), "missing required section: infNFe");
        assert_eq!(err.kind(), "missing_required_section");
    }
}
