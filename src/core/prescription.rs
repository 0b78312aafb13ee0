use crate::config::toml_config::UploadConfig;
use crate::core::catalog::Catalog;
use crate::core::reconcile::{ReconcileOptions, Reconciler};
use crate::domain::model::{PrescriptionOutcome, PrescriptionReport};
use crate::domain::ports::ExtractionGateway;
use crate::utils::error::{PharmacyError, Result};
use std::sync::Arc;

/// Upload → extraction → reconciliation, with outcome classification.
#[derive(Clone)]
pub struct PrescriptionService {
    catalog: Arc<Catalog>,
    gateway: Arc<dyn ExtractionGateway>,
    upload: UploadConfig,
    options: ReconcileOptions,
}

impl PrescriptionService {
    pub fn new(catalog: Arc<Catalog>, gateway: Arc<dyn ExtractionGateway>) -> Self {
        Self {
            catalog,
            gateway,
            upload: UploadConfig::default(),
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_upload_policy(mut self, upload: UploadConfig) -> Self {
        self.upload = upload;
        self
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn process(
        &self,
        file: &[u8],
        content_type: Option<&str>,
    ) -> Result<PrescriptionReport<'_>> {
        let mime_type = self.check_upload(file, content_type)?;
        tracing::info!("Processing prescription ({} bytes, {})", file.len(), mime_type);

        let medicines = self.gateway.extract(file, &mime_type).await?;
        tracing::info!("Extracted {} medicines from prescription", medicines.len());

        let result = Reconciler::new(&self.catalog)
            .options(self.options)
            .reconcile(&medicines);
        let outcome = PrescriptionOutcome::classify(medicines.len(), &result);

        match outcome {
            PrescriptionOutcome::EmptyExtraction => {
                tracing::warn!("No medicines found on prescription, manual selection needed")
            }
            PrescriptionOutcome::NoMatchesFound => {
                tracing::warn!("None of the extracted medicines are available")
            }
            PrescriptionOutcome::PartialMatch => tracing::info!(
                "{} medicines could not be added: {:?}",
                result.unmatched.len(),
                result.unmatched.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
            ),
            PrescriptionOutcome::AllMatched => {}
        }

        Ok(PrescriptionReport {
            medicines,
            result,
            outcome,
        })
    }

    /// 檢查檔案大小與類型，回傳正規化後的 MIME 類型
    pub fn check_upload(&self, file: &[u8], content_type: Option<&str>) -> Result<String> {
        if file.is_empty() {
            return Err(PharmacyError::EmptyUpload);
        }

        let limit = self.upload.max_size_bytes();
        if file.len() > limit {
            return Err(PharmacyError::FileTooLarge {
                size: file.len(),
                limit,
            });
        }

        let mime_type = resolve_mime_type(content_type, file);
        if !self.upload.accepts(&mime_type) {
            return Err(PharmacyError::UnsupportedFileType { mime_type });
        }
        Ok(mime_type)
    }
}

/// Normalizes a declared content type, falling back to magic-byte sniffing
/// when it is missing or generic.
pub fn resolve_mime_type(content_type: Option<&str>, file: &[u8]) -> String {
    let declared = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

    match declared.as_deref() {
        Some("image/jpg") | Some("image/pjpeg") => "image/jpeg".to_string(),
        Some(other) => other.to_string(),
        None => sniff_mime_type(file).to_string(),
    }
}

fn sniff_mime_type(file: &[u8]) -> &'static str {
    if file.starts_with(b"%PDF") {
        "application/pdf"
    } else if file.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if file.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ExtractedMention;
    use async_trait::async_trait;

    struct CannedGateway(Vec<ExtractedMention>);

    #[async_trait]
    impl ExtractionGateway for CannedGateway {
        async fn extract(&self, _file: &[u8], _mime_type: &str) -> Result<Vec<ExtractedMention>> {
            Ok(self.0.clone())
        }
    }

    fn service(mentions: Vec<ExtractedMention>) -> PrescriptionService {
        PrescriptionService::new(
            Arc::new(Catalog::sample()),
            Arc::new(CannedGateway(mentions)),
        )
    }

    #[test]
    fn test_resolve_mime_type() {
        assert_eq!(resolve_mime_type(Some("image/JPG"), b"x"), "image/jpeg");
        assert_eq!(
            resolve_mime_type(Some("application/pdf; charset=binary"), b"x"),
            "application/pdf"
        );
        assert_eq!(resolve_mime_type(None, b"%PDF-1.7"), "application/pdf");
        assert_eq!(
            resolve_mime_type(Some("application/octet-stream"), &[0xFF, 0xD8, 0xFF, 0xE0]),
            "image/jpeg"
        );
        assert_eq!(
            resolve_mime_type(None, b"hello"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_check_upload_rejections() {
        let svc = service(vec![]);
        assert!(matches!(
            svc.check_upload(b"", Some("application/pdf")),
            Err(PharmacyError::EmptyUpload)
        ));
        assert!(matches!(
            svc.check_upload(b"GIF89a", Some("image/gif")),
            Err(PharmacyError::UnsupportedFileType { .. })
        ));

        let tiny = svc.with_upload_policy(UploadConfig {
            max_size_mb: 1,
            ..UploadConfig::default()
        });
        let big = vec![0u8; 1024 * 1024 + 1];
        assert!(matches!(
            tiny.check_upload(&big, Some("application/pdf")),
            Err(PharmacyError::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_process_classifies_partial_match() {
        let svc = service(vec![
            ExtractedMention::new("Paracetamol").with_quantity(3),
            ExtractedMention::new("Unknown Drug"),
        ]);
        let report = svc.process(b"%PDF-1.4", None).await.unwrap();

        assert_eq!(report.outcome, PrescriptionOutcome::PartialMatch);
        assert_eq!(report.result.matched.len(), 1);
        assert_eq!(report.result.matched[0].quantity, 3);
        assert_eq!(report.summary(), "1 of 2 medicines found in our stock");
    }

    #[tokio::test]
    async fn test_process_keeps_unreadable_names_as_unmatched() {
        let svc = service(vec![
            ExtractedMention::new("Ибупрофен").with_quantity(2),
            ExtractedMention::new("アスピリン"),
        ]);
        let report = svc.process(b"%PDF-1.4", None).await.unwrap();

        assert_eq!(report.medicines.len(), 2);
        assert!(report.result.matched.is_empty());
        assert_eq!(report.result.unmatched, report.medicines);
        assert_eq!(report.outcome, PrescriptionOutcome::NoMatchesFound);
    }

    #[tokio::test]
    async fn test_process_empty_extraction() {
        let svc = service(vec![]);
        let report = svc.process(b"%PDF-1.4", None).await.unwrap();
        assert_eq!(report.outcome, PrescriptionOutcome::EmptyExtraction);
    }
}
