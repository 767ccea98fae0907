//! Single-document orchestration.
//!
//! Order per document: guard → text → classify → ensemble → normalise →
//! validate dates → validate issuer → flags → status → fallback → audit.
//! Guard, text, and classification failures end the document with
//! [`DocumentOutcome::NotProcessed`]; every later stage always produces a
//! verdict.

use std::path::Path;
use std::sync::Arc;

use certitude_ai::{Ensemble, FieldOracle, explain};
use certitude_core::{
    Clock, Document, GuardError, SecurityGuard, SystemClock, TargetField, VerifyConfig,
    apply_external, assign_status, needs_external_check, normalize, validate_dates,
};
use certitude_store::{AuditLogger, AuditRecord, check_for_issues};
use certitude_sync::{ExternalVerifier, RegistryVerifier};
use chrono::Utc;
use tracing::{info, warn};

use crate::report::{DocumentOutcome, SkipReason, VerificationReport};
use crate::source::{FsTextSource, TextSource};

/// The verification pipeline with all of its collaborators.
///
/// Configuration is read-only once built; one `Pipeline` can process many
/// documents concurrently.
pub struct Pipeline {
    config: Arc<VerifyConfig>,
    guard: SecurityGuard,
    ensemble: Ensemble,
    oracle: Arc<dyn FieldOracle>,
    text_source: Arc<dyn TextSource>,
    verifier: Arc<dyn ExternalVerifier>,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Build a pipeline rooted at `config.data_root`, reading text from disk,
    /// verifying externally with the simulated registry probe, and dating
    /// against the system clock.
    pub fn new(
        config: VerifyConfig,
        oracle: Arc<dyn FieldOracle>,
        audit: AuditLogger,
    ) -> Result<Self, GuardError> {
        let guard = SecurityGuard::new(&config.data_root, config.max_file_size)?;
        let text_source = Arc::new(FsTextSource::new(guard.clone()));
        let verifier = Arc::new(RegistryVerifier::simulated(config.registry.clone()));
        Ok(Self {
            ensemble: Ensemble::from_config(&config),
            config: Arc::new(config),
            guard,
            oracle,
            text_source,
            verifier,
            audit,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ExternalVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_text_source(mut self, text_source: Arc<dyn TextSource>) -> Self {
        self.text_source = text_source;
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn guard(&self) -> &SecurityGuard {
        &self.guard
    }

    /// Admit, read, and process the file at `path`.
    pub async fn process_path(&self, path: &Path) -> DocumentOutcome {
        let skip = |reason: SkipReason| {
            warn!(path = %path.display(), %reason, "document not processed");
            DocumentOutcome::NotProcessed {
                path: path.to_path_buf(),
                reason,
            }
        };

        // Guard checks and text reads are blocking filesystem work.
        let guard = self.guard.clone();
        let text_source = Arc::clone(&self.text_source);
        let requested = path.to_path_buf();
        let read = tokio::task::spawn_blocking(move || -> Result<_, SkipReason> {
            let resolved = guard.admit(&requested)?;
            let acquired = text_source.extract_text(&resolved)?;
            Ok((resolved, acquired))
        })
        .await;
        let (resolved, acquired) = match read {
            Ok(Ok(read)) => read,
            Ok(Err(reason)) => return skip(reason),
            Err(e) => return skip(SkipReason::Interrupted(e.to_string())),
        };

        let doc = Document::from_path(&resolved, acquired.text, acquired.used_ocr);
        match self.process_document(&doc).await {
            Ok(report) => DocumentOutcome::Processed(Box::new(report)),
            Err(reason) => skip(reason),
        }
    }

    /// Run every stage after text acquisition on `doc`.
    pub async fn process_document(
        &self,
        doc: &Document,
    ) -> Result<VerificationReport, SkipReason> {
        let classification = explain(&doc.file_type, &doc.text_content);
        if !classification.is_certificate() {
            info!(doc_id = %doc.doc_id, file_type = %doc.file_type, "not a certificate");
            return Err(SkipReason::NotCertificate);
        }
        info!(
            doc_id = %doc.doc_id,
            rule = classification.rule.map(|r| r.as_str()).unwrap_or_default(),
            used_ocr = doc.used_ocr,
            "identified as certificate"
        );

        let mut diagnostics = Vec::new();
        let extraction = self
            .ensemble
            .run(self.oracle.as_ref(), &doc.text_content)
            .await;
        if let Some(reason) = extraction.reason() {
            diagnostics.push(reason.to_string());
        }
        let consensus = extraction.into_value();

        let normalized = normalize(&consensus);
        let validation = validate_dates(
            normalized.get(TargetField::IssuedDate),
            normalized.get(TargetField::ExpiryDate),
            self.clock.as_ref(),
        );
        let issuer = normalized.get(TargetField::Issuer);
        let mut issuer_validation = self.config.trust_list.validate_issuer(issuer);
        let flags = check_for_issues(&normalized.fields, &normalized.confidence);

        let mut final_status = assign_status(
            &normalized.confidence,
            &normalized.fields,
            &validation,
            &issuer_validation,
        );

        let mut external_verification = None;
        if needs_external_check(final_status, &issuer_validation) {
            info!(doc_id = %doc.doc_id, "issuer not trusted, trying external verification");
            let external = self.verifier.verify(issuer, &normalized.fields).await;
            final_status = apply_external(final_status, &mut issuer_validation, &external);
            info!(doc_id = %doc.doc_id, external = %external.status, "external verification done");
            external_verification = Some(external);
        }

        let record = AuditRecord::new(
            &doc.doc_id,
            Utc::now(),
            normalized.fields.clone(),
            normalized.confidence.clone(),
            validation.clone(),
            flags.clone(),
        );
        if let Some(reason) = self.audit.log(record).reason() {
            diagnostics.push(format!("audit: {reason}"));
        }

        info!(doc_id = %doc.doc_id, status = %final_status, flags = flags.len(), "document verified");

        Ok(VerificationReport {
            doc_id: doc.doc_id.clone(),
            fields: normalized.fields,
            confidence: normalized.confidence,
            confidence_flags: flags,
            validation,
            issuer_validation,
            external_verification,
            final_status,
            voting_log: consensus.voting_log,
            diagnostics,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;

    use certitude_ai::StaticOracle;
    use certitude_core::{
        ExternalStatus, ExtractionAttempt, FieldGuess, FinalStatus, FixedClock, IssuerStatus,
        TrustList,
    };
    use certitude_store::MemoryAuditSink;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::source::{AcquiredText, TextError};

    pub(crate) const SAMPLE: &str = "CERTIFICATE OF COMPLETION\n\
        This is to certify that John Doe has completed the Quality Management System course.\n\
        Certificate Number: ISO-9001-2024-098\n\
        Issued By: ISO Authority\n\
        Issued On: 2024-01-15\n\
        Valid Until: 2026-01-15\n";

    pub(crate) struct Fixture {
        _tmp: TempDir,
        pub root: PathBuf,
        pub sink: Arc<MemoryAuditSink>,
    }

    impl Fixture {
        pub fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let root = tmp.path().canonicalize().unwrap();
            Self {
                _tmp: tmp,
                root,
                sink: Arc::new(MemoryAuditSink::new()),
            }
        }

        pub fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.root.join(name);
            std::fs::write(&path, contents).unwrap();
            path
        }

        pub fn config(&self, trusted: &[&str]) -> VerifyConfig {
            VerifyConfig {
                data_root: self.root.clone(),
                trust_list: TrustList::from_issuers(trusted.iter().copied()),
                ..Default::default()
            }
        }

        pub fn pipeline_with(&self, config: VerifyConfig, oracle: Arc<dyn FieldOracle>) -> Pipeline {
            Pipeline::new(config, oracle, AuditLogger::new(self.sink.clone()))
                .unwrap()
                .with_clock(Arc::new(FixedClock(
                    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                )))
        }

        pub fn pipeline(&self, trusted: &[&str]) -> Pipeline {
            self.pipeline_with(self.config(trusted), Arc::new(StaticOracle::demo()))
        }
    }

    struct FailingOracle;

    #[async_trait::async_trait]
    impl FieldOracle for FailingOracle {
        async fn extract(
            &self,
            _text: &str,
        ) -> Result<ExtractionAttempt, certitude_ai::OracleError> {
            Err(certitude_ai::OracleError::Malformed("garbage".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn report(outcome: DocumentOutcome) -> VerificationReport {
        match outcome {
            DocumentOutcome::Processed(r) => *r,
            DocumentOutcome::NotProcessed { reason, .. } => {
                panic!("expected a report, got skip: {reason}")
            }
        }
    }

    #[tokio::test]
    async fn trusted_current_certificate_is_verified() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let r = report(fx.pipeline(&["ISO Authority"]).process_path(&path).await);

        assert_eq!(r.doc_id, "iso_cert");
        assert_eq!(r.final_status, FinalStatus::Verified);
        assert_eq!(r.fields[&TargetField::IssuedDate].as_deref(), Some("2024-01-15"));
        assert_eq!(r.fields[&TargetField::ExpiryDate].as_deref(), Some("2026-01-15"));
        assert!(r.confidence_flags.is_empty());
        assert!(r.external_verification.is_none());
        assert_eq!(r.issuer_validation.status, IssuerStatus::Valid);
        assert!(!r.is_degraded());
        assert_eq!(
            r.voting_log.get(TargetField::Issuer).unwrap().winning_votes(),
            3
        );
    }

    #[tokio::test]
    async fn audit_record_written_per_document() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        fx.pipeline(&["ISO Authority"]).process_path(&path).await;

        let records = fx.sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doc_id, "iso_cert");
        assert_eq!(records[0].stage, "extraction_validation");
        assert!(!records[0].needs_manual_review);
        assert_eq!(
            records[0].fields[&TargetField::CertificateNumber].as_deref(),
            Some("ISO-9001-2024-098"),
            "audit log is not redacted"
        );
    }

    #[tokio::test]
    async fn unknown_untrusted_issuer_goes_to_manual_review() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let r = report(fx.pipeline(&[]).process_path(&path).await);

        let ext = r.external_verification.unwrap();
        assert_eq!(ext.status, ExternalStatus::ManualVerificationRequired);
        assert_eq!(r.final_status, FinalStatus::ManualReviewRequired);
        assert_eq!(r.issuer_validation.status, IssuerStatus::Untrusted);
    }

    #[tokio::test]
    async fn registered_issuer_verified_externally() {
        let fx = Fixture::new();
        let path = fx.write("aws.txt", SAMPLE);
        let oracle = StaticOracle::new(
            ExtractionAttempt::new()
                .with(TargetField::Issuer, FieldGuess::new("AWS Training", 0.95))
                .with(TargetField::CertificateNumber, FieldGuess::new("AWS-123456", 0.95))
                .with(TargetField::IssuedDate, FieldGuess::new("2024-01-15", 0.95))
                .with(TargetField::ExpiryDate, FieldGuess::new("2027-01-15", 0.95))
                .with(TargetField::Subject, FieldGuess::new("Cloud Practitioner", 0.95)),
        );
        let r = report(
            fx.pipeline_with(fx.config(&[]), Arc::new(oracle))
                .process_path(&path)
                .await,
        );

        assert_eq!(r.final_status, FinalStatus::Verified);
        assert_eq!(r.issuer_validation.status, IssuerStatus::VerifiedExternally);
        assert!(!r.issuer_validation.is_trusted);
        assert_eq!(
            r.external_verification.unwrap().reason,
            "Validated against AWS Registry"
        );
    }

    #[tokio::test]
    async fn expired_certificate() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let r = report(
            fx.pipeline(&["ISO Authority"])
                .with_clock(Arc::new(FixedClock(
                    NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
                )))
                .process_path(&path)
                .await,
        );
        assert_eq!(r.final_status, FinalStatus::Expired);
    }

    #[tokio::test]
    async fn unavailable_trust_list_reports_reason() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let config = VerifyConfig {
            trust_list: TrustList::load(&fx.root.join("missing.json")),
            ..fx.config(&[])
        };
        let r = report(
            fx.pipeline_with(config, Arc::new(StaticOracle::demo()))
                .process_path(&path)
                .await,
        );
        assert!(matches!(
            r.issuer_validation.status,
            IssuerStatus::Unavailable(_)
        ));
        assert_eq!(r.final_status, FinalStatus::ManualReviewRequired);
    }

    #[tokio::test]
    async fn oracle_outage_degrades_to_manual_review() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let r = report(
            fx.pipeline_with(fx.config(&["ISO Authority"]), Arc::new(FailingOracle))
                .process_path(&path)
                .await,
        );

        assert!(r.is_degraded());
        assert!(r.diagnostics[0].contains("extraction attempts failed"));
        assert!(r.fields.values().all(Option::is_none));
        assert_eq!(r.final_status, FinalStatus::ManualReviewRequired);
        assert!(r.confidence_flags.contains(&"MISSING_ISSUER".to_string()));
        assert_eq!(fx.sink.records().len(), 1);
    }

    #[tokio::test]
    async fn non_certificate_not_processed() {
        let fx = Fixture::new();
        let path = fx.write("notes.txt", "This is just a random document");
        let outcome = fx.pipeline(&["ISO Authority"]).process_path(&path).await;
        assert!(matches!(
            outcome,
            DocumentOutcome::NotProcessed {
                reason: SkipReason::NotCertificate,
                ..
            }
        ));
        assert!(fx.sink.records().is_empty());
    }

    #[tokio::test]
    async fn traversal_not_processed() {
        let fx = Fixture::new();
        let outside = fx.root.join("..").join("outside.txt");
        let outcome = fx.pipeline(&[]).process_path(&outside).await;
        assert!(matches!(
            outcome,
            DocumentOutcome::NotProcessed {
                reason: SkipReason::Guard(GuardError::PathTraversal(_)),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn oversized_file_not_processed() {
        let fx = Fixture::new();
        let path = fx.write("big.txt", SAMPLE);
        let config = VerifyConfig {
            max_file_size: 10,
            ..fx.config(&[])
        };
        let outcome = fx
            .pipeline_with(config, Arc::new(StaticOracle::demo()))
            .process_path(&path)
            .await;
        assert!(matches!(
            outcome,
            DocumentOutcome::NotProcessed {
                reason: SkipReason::Guard(GuardError::TooLarge { .. }),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rerun_is_byte_identical() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", SAMPLE);
        let pipeline = fx.pipeline(&[]);
        let first = report(pipeline.process_path(&path).await);
        let second = report(pipeline.process_path(&path).await);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(fx.sink.records().len(), 2);
    }

    /// Blocks its caller until text is handed over on the channel.
    struct HandoffSource(std::sync::Mutex<std::sync::mpsc::Receiver<String>>);

    impl TextSource for HandoffSource {
        fn extract_text(&self, _path: &Path) -> Result<AcquiredText, TextError> {
            let text = self
                .0
                .lock()
                .unwrap()
                .recv()
                .map_err(|e| TextError::Unsupported {
                    path: PathBuf::from("handoff"),
                    detail: e.to_string(),
                })?;
            Ok(AcquiredText {
                text,
                used_ocr: false,
            })
        }
    }

    #[tokio::test]
    async fn text_acquisition_does_not_block_the_runtime() {
        let fx = Fixture::new();
        let path = fx.write("iso_cert.txt", "placeholder");
        let (tx, rx) = std::sync::mpsc::channel();
        let pipeline = fx
            .pipeline(&["ISO Authority"])
            .with_text_source(Arc::new(HandoffSource(std::sync::Mutex::new(rx))));

        // On a current-thread runtime the sender only gets polled if the
        // blocking read runs off the runtime thread.
        let (outcome, ()) = tokio::join!(pipeline.process_path(&path), async {
            tokio::task::yield_now().await;
            tx.send(SAMPLE.to_string()).unwrap();
        });
        assert_eq!(report(outcome).final_status, FinalStatus::Verified);
    }
}
