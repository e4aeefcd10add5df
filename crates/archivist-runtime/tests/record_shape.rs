//! End-to-end: directory source → pipeline → saved JSON record.

use std::sync::Arc;

use archivist_core::{ExtractorConfig, Priority, Result};
use archivist_infer::{Generation, InferenceBackend, ModelProfile};
use archivist_runtime::{
    save_record, DirectorySource, ExtractionMode, ExtractionOrchestrator, MetadataPipeline,
};
use async_trait::async_trait;

/// Answers every prompt with the same text.
struct FixedBackend(&'static str);

#[async_trait]
impl InferenceBackend for FixedBackend {
    async fn generate(
        &self,
        _model: &str,
        _prompt: &str,
        _profile: &ModelProfile,
        _structured: bool,
    ) -> Result<Generation> {
        Ok(Generation::new(self.0, 0.05))
    }
}

const LETTER: &str = "CENTRAL AMERICA TASK FORCE\n\
                      6 January 1986\n\
                      \n\
                      Dear Friends,\n\
                      Blessings of peace and courage for the new year!\n\
                      We thank everyone who gave their time to the clinic.\n\
                      Sincerely,\n\
                      Ruth Miller";

#[tokio::test]
async fn test_saved_record_has_expected_shape() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("task_force_1986.txt"), LETTER).unwrap();

    let orchestrator = ExtractionOrchestrator::new(
        ExtractorConfig::default(),
        Arc::new(FixedBackend("New Year Blessings Message")),
    );
    let pipeline = MetadataPipeline::new(Arc::new(orchestrator));
    let source = DirectorySource::new(&input);

    let record = pipeline
        .process_document(&source, "task_force_1986", ExtractionMode::Parallel, Priority::Balanced)
        .await
        .unwrap();
    assert_eq!(record.source_file.as_deref(), Some("task_force_1986.txt"));
    assert_eq!(record.date, "1986");

    let output = dir.path().join("output");
    let path = save_record(&record, &input.join("task_force_1986.txt"), &output).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    for field in ["title", "date", "description", "volume_issue"] {
        assert!(json[field].is_string(), "{field} should be a string");
        let detail = &json["extraction_metadata"]["field_details"][field];
        assert!(detail["confidence"].is_f64());
        assert!(detail["model_used"].is_string());
        assert!(detail["processing_time"].is_f64());
    }

    let meta = &json["extraction_metadata"];
    assert!(meta["total_processing_time"].is_f64());
    assert!(meta["extraction_timestamp"].is_string());
    assert_eq!(meta["extraction_method"], "parallel");
    assert_eq!(meta["priority_mode"], "balanced");

    let analysis = &json["document_analysis"];
    assert_eq!(analysis["document_type"], "letter");
    assert!(analysis["quality"]["overall_quality"].is_f64());
    assert_eq!(analysis["structure"]["has_signatures"], true);
}

#[tokio::test]
async fn test_missing_document_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = ExtractionOrchestrator::new(
        ExtractorConfig::default(),
        Arc::new(FixedBackend("unused")),
    );
    let pipeline = MetadataPipeline::new(Arc::new(orchestrator));
    let source = DirectorySource::new(dir.path());

    let outcome = pipeline
        .process_document(&source, "absent", ExtractionMode::Parallel, Priority::Balanced)
        .await;
    assert!(outcome.is_err());
}
