//! Ownership certificates.

use crate::domain::designs::DesignUuid;

const CERTIFICATES_BUCKET: &str = "certificates";

/// Derives a design's certificate URL from its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateLocator {
    prefix: String,
}

impl CertificateLocator {
    /// Certificates served from the public storage of the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            prefix: format!(
                "{}/storage/v1/object/public/{CERTIFICATES_BUCKET}",
                base_url.trim_end_matches('/')
            ),
        }
    }

    #[must_use]
    pub fn url_for(&self, design: DesignUuid) -> String {
        format!("{}/{design}.pdf", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn certificate_url_is_derived_from_the_design_id() -> TestResult {
        let locator = CertificateLocator::new("https://project.example.co/");
        let design: DesignUuid = "0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77".parse()?;

        assert_eq!(
            locator.url_for(design),
            "https://project.example.co/storage/v1/object/public/certificates/0191e7b4-8c4e-7a52-9a0e-3c5d2f1b6a77.pdf"
        );

        Ok(())
    }
}
