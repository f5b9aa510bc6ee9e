//! Integration tests for the transformer and bulk preparation.
//!
//! Runs the full transformation over the curated extract fixtures.
//!
//! ```bash
//! cargo test -p vocabgraph-core --test transform_fixture
//! ```

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vocabgraph_core::{
    BulkPreparer, HeaderMode, RecordFile, TransformConfig, Transformer,
};

// ============================================================================
// Helpers
// ============================================================================

/// Get the path to the extract fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("extract")
}

fn data_rows(path: &Path, has_header: bool) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

// ============================================================================
// Online layout
// ============================================================================

#[test]
fn test_fixture_transforms_every_table() {
    let temp = TempDir::new().unwrap();
    let transformer = Transformer::new(
        TransformConfig::new(fixtures_dir(), temp.path()).with_chunk_size(1),
    );

    let summary = transformer.run().unwrap();

    assert_eq!(summary.outputs.len(), 7);
    assert_eq!(summary.rows(RecordFile::DomainNodes), 2);
    assert_eq!(summary.rows(RecordFile::VocabularyNodes), 1);
    assert_eq!(summary.rows(RecordFile::ConceptNodes), 2);
    assert_eq!(summary.rows(RecordFile::Semantic), 1);
    assert_eq!(summary.rows(RecordFile::Ancestor), 1);
}

#[test]
fn test_contextual_edges_are_twice_the_concepts() {
    let temp = TempDir::new().unwrap();
    let summary = Transformer::new(TransformConfig::new(fixtures_dir(), temp.path()))
        .run()
        .unwrap();

    let concepts = summary.rows(RecordFile::ConceptNodes);
    let contextual =
        summary.rows(RecordFile::InDomain) + summary.rows(RecordFile::FromVocabulary);
    assert_eq!(contextual, 2 * concepts);
}

#[test]
fn test_concept_record_columns() {
    let temp = TempDir::new().unwrap();
    Transformer::new(TransformConfig::new(fixtures_dir(), temp.path()))
        .transform_concepts()
        .unwrap();

    let rows = data_rows(&temp.path().join("nodes_concept.csv"), true);
    assert_eq!(
        rows[0],
        vec![
            "1177480",
            "1177480",
            "Concept|Drug|Standard",
            "enalapril",
            "Drug",
            "SNOMED",
            "Ingredient",
            "S",
            "3827",
            "1970-01-01",
            "2099-12-31",
            "",
            "Vasotec|enalapril maleate",
        ]
    );
    assert_eq!(rows[1][2], "Concept|Condition|Standard");
}

#[test]
fn test_identical_input_gives_identical_output() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    Transformer::new(TransformConfig::new(fixtures_dir(), a.path()).with_chunk_size(1))
        .run()
        .unwrap();
    Transformer::new(TransformConfig::new(fixtures_dir(), b.path()))
        .run()
        .unwrap();

    for file in RecordFile::ALL {
        assert_eq!(
            std::fs::read(a.path().join(file.file_name())).unwrap(),
            std::fs::read(b.path().join(file.file_name())).unwrap(),
            "{file} differs"
        );
    }
}

#[test]
fn test_failure_leaves_earlier_files() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("export");
    std::fs::create_dir_all(&input).unwrap();
    for name in ["domain.csv", "vocabulary.csv"] {
        std::fs::copy(fixtures_dir().join(name), input.join(name)).unwrap();
    }
    std::fs::write(input.join("concepts_optimized.csv"), "concept_id\n1\n").unwrap();

    let output = temp.path().join("import");
    let err = Transformer::new(TransformConfig::new(&input, &output))
        .run()
        .unwrap_err();

    assert!(err.to_string().contains("missing required column"));
    assert!(output.join("nodes_domain.csv").exists());
    assert!(output.join("nodes_vocabulary.csv").exists());
}

// ============================================================================
// Bulk layout
// ============================================================================

#[test]
fn test_bulk_preparation_writes_pairs_and_command() {
    let temp = TempDir::new().unwrap();
    let bulk_dir = temp.path().join("bulk");
    let preparer = BulkPreparer::new(
        TransformConfig::new(fixtures_dir(), &bulk_dir).with_header_mode(HeaderMode::Inline),
        "neo4j",
    );

    let plan = preparer.prepare().unwrap();

    for pair in plan.nodes.iter().chain(plan.relationships.iter()) {
        let header = data_rows(&pair.header, false);
        assert_eq!(header.len(), 1, "{:?}", pair.header);
        assert_eq!(header[0], pair.file.header().to_vec());
        // Data files carry no header row
        let data = data_rows(&pair.data, false);
        assert_eq!(data.len() as u64, plan.summary.rows(pair.file));
    }

    let command = plan.render();
    assert!(command.starts_with("neo4j-admin database import full \\"));
    assert!(command.contains(&format!(
        "--nodes='{},{}'",
        bulk_dir.join("nodes_concept_header.csv").display(),
        bulk_dir.join("nodes_concept.csv").display()
    )));
    assert!(command.ends_with("neo4j"));
}
