//! Integration tests for the online loader and validator.
//!
//! Transforms the core extract fixtures and loads them into the in-memory
//! store. The Neo4j test at the bottom needs a live server with APOC.
//!
//! ```bash
//! cargo test -p vocabgraph-store --test online_load
//! ```

mod common;

use common::{transformed_fixtures, FailingStore};
use pretty_assertions::assert_eq;
use vocabgraph_core::RecordFile;
use vocabgraph_store::{
    clear_graph, create_schema, CountMap, Direction, GraphStore, LoadError, LoadStage,
    MemoryGraph, OnlineLoader, ProbeOutcome, Validator, REQUIRED_SCHEMA,
};

fn counts(entries: &[(&str, u64)]) -> CountMap {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn expected_nodes() -> CountMap {
    counts(&[
        ("Concept:Condition:Standard", 1),
        ("Concept:Drug:Standard", 1),
        ("Domain", 2),
        ("Vocabulary", 1),
    ])
}

fn expected_relationships() -> CountMap {
    counts(&[
        ("FROM_VOCABULARY", 2),
        ("HAS_ANCESTOR", 1),
        ("IN_DOMAIN", 2),
        ("TREATS", 1),
    ])
}

// ============================================================================
// Full reload
// ============================================================================

#[tokio::test]
async fn test_full_load_produces_expected_graph() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();

    let mut loader = OnlineLoader::new(&store, settings);
    let report = loader.run().await.unwrap();

    assert_eq!(loader.stage(), LoadStage::Done);
    assert_eq!(report.stages.len(), 6);
    assert_eq!(report.stage(LoadStage::LoadMetadata).unwrap().rows, 3);
    assert_eq!(report.stage(LoadStage::LoadConcepts).unwrap().rows, 2);
    assert_eq!(report.rows_loaded(), 7);

    let validator = Validator::new(&store);
    assert_eq!(validator.node_counts().await.unwrap(), expected_nodes());
    assert_eq!(
        validator.relationship_counts().await.unwrap(),
        expected_relationships()
    );
    assert_eq!(
        store.schema_catalog().await.unwrap().len(),
        REQUIRED_SCHEMA.len()
    );
}

#[tokio::test]
async fn test_stages_start_in_order() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();
    let mut started = Vec::new();

    OnlineLoader::new(&store, settings)
        .run_with(|stage| started.push(stage))
        .await
        .unwrap();

    assert_eq!(
        started,
        vec![
            LoadStage::Clearing,
            LoadStage::SchemaCreation,
            LoadStage::LoadMetadata,
            LoadStage::LoadConcepts,
            LoadStage::LoadSemanticEdges,
            LoadStage::LoadAncestorEdges,
        ]
    );
}

#[tokio::test]
async fn test_reload_without_clear_is_idempotent() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();

    OnlineLoader::new(&store, settings.clone()).run().await.unwrap();
    let report = OnlineLoader::new(&store, settings.with_skip_clear(true))
        .run()
        .await
        .unwrap();

    assert!(report.stage(LoadStage::Clearing).unwrap().skipped);
    assert_eq!(store.node_label_counts().await.unwrap(), expected_nodes());
    assert_eq!(
        store.relationship_type_counts().await.unwrap(),
        expected_relationships()
    );
}

#[tokio::test]
async fn test_reload_without_clear_follows_changed_rows() {
    let (temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();
    OnlineLoader::new(&store, settings.clone()).run().await.unwrap();

    // enalapril moves to Condition and loses its standard flag
    let mut concepts = RecordFile::ConceptNodes.header().join(",");
    concepts.push_str(
        "\n1177480,1177480,Concept|Condition,enalapril,Condition,SNOMED,Ingredient,,3827,\
         1970-01-01,2099-12-31,D,\n\
         316866,316866,Concept|Condition|Standard,Hypertensive disorder,Condition,SNOMED,\
         Clinical Finding,S,38341003,1970-01-01,2099-12-31,,\n",
    );
    std::fs::write(
        temp.path().join(RecordFile::ConceptNodes.file_name()),
        concepts,
    )
    .unwrap();

    OnlineLoader::new(&store, settings.with_skip_clear(true))
        .run()
        .await
        .unwrap();

    assert_eq!(
        store.node_label_counts().await.unwrap(),
        counts(&[
            ("Concept:Condition", 1),
            ("Concept:Condition:Standard", 1),
            ("Domain", 2),
            ("Vocabulary", 1),
        ])
    );
    assert_eq!(
        store.relationship_type_counts().await.unwrap(),
        expected_relationships()
    );

    let outcome = store.probe_concept(1_177_480, 3, 25).await.unwrap();
    let probe = outcome.found().unwrap();
    assert_eq!(probe.labels, vec!["Concept", "Condition"]);
    assert_eq!(probe.properties.standard_concept, None);
    assert_eq!(probe.properties.invalid_reason.as_deref(), Some("D"));
    assert!(probe.synonyms.is_empty());
    let domain = probe.relationship("IN_DOMAIN", Direction::Outgoing).unwrap();
    assert_eq!(domain.count, 1);
    assert_eq!(domain.sample_neighbors, vec!["Condition"]);
}

#[tokio::test]
async fn test_probe_of_sample_concept() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();
    OnlineLoader::new(&store, settings).run().await.unwrap();

    let report = Validator::new(&store).run(Some(1_177_480)).await.unwrap();
    let probe = report.probe.as_ref().and_then(ProbeOutcome::found).unwrap();

    assert_eq!(probe.properties.name, "enalapril");
    assert_eq!(probe.labels, vec!["Concept", "Drug", "Standard"]);
    assert_eq!(probe.synonyms, vec!["Vasotec", "enalapril maleate"]);
    assert_eq!(probe.synonym_count, 2);

    let treats = probe.relationship("TREATS", Direction::Outgoing).unwrap();
    assert_eq!(treats.count, 1);
    assert_eq!(treats.sample_neighbors, vec!["Hypertensive disorder"]);
    let ancestor = probe.relationship("HAS_ANCESTOR", Direction::Outgoing).unwrap();
    assert_eq!(ancestor.sample_neighbors, vec!["Hypertensive disorder"]);
}

#[tokio::test]
async fn test_probe_of_missing_concept() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();
    OnlineLoader::new(&store, settings).run().await.unwrap();

    let outcome = Validator::new(&store).probe(999).await.unwrap();
    assert_eq!(outcome, ProbeOutcome::NotFound { concept_id: 999 });
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_record_file_fails_before_mutation() {
    let (temp, settings) = transformed_fixtures();
    std::fs::remove_file(temp.path().join(RecordFile::Ancestor.file_name())).unwrap();

    let store = MemoryGraph::new();
    create_schema(&store).await.unwrap();

    let err = OnlineLoader::new(&store, settings).run().await.unwrap_err();
    assert!(matches!(err, LoadError::MissingRecordFile { .. }), "{err}");
    // Nothing was cleared
    assert_eq!(
        store.schema_catalog().await.unwrap().len(),
        REQUIRED_SCHEMA.len()
    );
}

#[tokio::test]
async fn test_failed_stage_stops_later_stages() {
    let (_temp, settings) = transformed_fixtures();
    let store = FailingStore::new(RecordFile::Semantic);

    let mut loader = OnlineLoader::new(&store, settings);
    let err = loader.run().await.unwrap_err();

    assert_eq!(err.failed_stage(), Some(LoadStage::LoadSemanticEdges));
    assert_eq!(loader.stage(), LoadStage::Failed);
    assert_eq!(
        store.loaded(),
        vec![
            RecordFile::DomainNodes,
            RecordFile::VocabularyNodes,
            RecordFile::ConceptNodes,
        ]
    );

    // Earlier stages stay committed
    let nodes = store.node_label_counts().await.unwrap();
    assert_eq!(nodes, expected_nodes());
    let rels = store.relationship_type_counts().await.unwrap();
    assert_eq!(rels.get("HAS_ANCESTOR"), None);
}

// ============================================================================
// Clearing
// ============================================================================

#[tokio::test]
async fn test_clear_empties_graph_and_schema() {
    let (_temp, settings) = transformed_fixtures();
    let store = MemoryGraph::new();
    OnlineLoader::new(&store, settings).run().await.unwrap();

    let cleared = clear_graph(&store, 1).await.unwrap();

    assert_eq!(cleared.constraints_dropped, 3);
    assert_eq!(cleared.indexes_dropped, 2);
    let report = Validator::new(&store).run(None).await.unwrap();
    assert_eq!(report.total_nodes(), 0);
    assert_eq!(report.total_relationships(), 0);
    assert!(store.schema_catalog().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let store = MemoryGraph::new();
    clear_graph(&store, 10).await.unwrap();
    let second = clear_graph(&store, 10).await.unwrap();
    assert_eq!(second.constraints_dropped + second.indexes_dropped, 0);
}

// ============================================================================
// Neo4j
// ============================================================================

#[tokio::test]
#[ignore] // Requires Neo4j with APOC and the fixture records in its import directory
async fn test_neo4j_full_load() {
    use vocabgraph_store::{Neo4jSettings, Neo4jStore};

    let (_temp, settings) = transformed_fixtures();
    let password = std::env::var("NEO4J_PASSWORD").unwrap_or_default();
    let prefix = std::env::var("VOCABGRAPH_IMPORT_URI_PREFIX")
        .unwrap_or_else(|_| "file:///".to_string());
    let store = Neo4jStore::connect(&Neo4jSettings::default().with_credentials("neo4j", password))
        .await
        .unwrap();

    OnlineLoader::new(&store, settings.with_import_uri_prefix(prefix))
        .run()
        .await
        .unwrap();

    assert_eq!(store.node_label_counts().await.unwrap(), expected_nodes());
}
