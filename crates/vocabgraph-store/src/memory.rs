//! In-process [`GraphStore`] on a petgraph `StableDiGraph`.
//!
//! Applies record files with the same upsert semantics as the server
//! statements: nodes merge by identifier and take the row's properties and
//! labels, edges merge by (start, type, end) and take the row's properties,
//! and rows whose endpoints are missing are skipped. Used for dry runs and
//! tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use csv::StringRecord;
use parking_lot::RwLock;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as EdgeDirection;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::GraphStore;
use crate::types::{
    neighbor_name, ConceptProbe, ConceptProperties, CountMap, Direction, ProbeOutcome,
    RecordSource, RelationshipSummary, SchemaDefinition, SchemaObject,
};
use vocabgraph_core::{
    parse_record_date, parse_synonyms, LabelSet, RecordFile, DOMAIN_LABEL, FROM_VOCABULARY,
    IN_DOMAIN, VOCABULARY_LABEL,
};

// ============================================================================
// Graph data
// ============================================================================

#[derive(Debug, Clone)]
struct ConceptNode {
    properties: ConceptProperties,
    labels: LabelSet,
    synonyms: Vec<String>,
}

#[derive(Debug, Clone)]
enum NodeData {
    Concept(ConceptNode),
    Domain {
        domain_id: String,
        domain_name: String,
        domain_concept_id: i64,
    },
    Vocabulary {
        vocabulary_id: String,
        vocabulary_name: String,
        vocabulary_reference: String,
        vocabulary_version: String,
        vocabulary_concept_id: i64,
    },
}

impl NodeData {
    fn group_key(&self) -> String {
        match self {
            NodeData::Concept(concept) => concept.labels.group_key(),
            NodeData::Domain { .. } => DOMAIN_LABEL.to_string(),
            NodeData::Vocabulary { .. } => VOCABULARY_LABEL.to_string(),
        }
    }

    fn display_name(&self) -> String {
        match self {
            NodeData::Concept(concept) => {
                let id = concept.properties.concept_id.to_string();
                neighbor_name([Some(concept.properties.name.as_str()), Some(id.as_str())])
            }
            NodeData::Domain {
                domain_id,
                domain_name,
                ..
            } => neighbor_name([Some(domain_name.as_str()), Some(domain_id.as_str())]),
            NodeData::Vocabulary {
                vocabulary_id,
                vocabulary_name,
                ..
            } => neighbor_name([Some(vocabulary_name.as_str()), Some(vocabulary_id.as_str())]),
        }
    }
}

#[derive(Debug, Clone)]
struct EdgeData {
    rel_type: String,
    properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum NodeKey {
    Concept(i64),
    Domain(String),
    Vocabulary(String),
}

#[derive(Default)]
struct GraphState {
    graph: StableDiGraph<NodeData, EdgeData>,
    index: HashMap<NodeKey, NodeIndex>,
    schema: Vec<SchemaObject>,
}

impl GraphState {
    fn upsert_node(&mut self, key: NodeKey, data: NodeData) -> NodeIndex {
        match self.index.get(&key) {
            Some(&idx) => {
                if let Some(existing) = self.graph.node_weight_mut(idx) {
                    *existing = data;
                }
                idx
            }
            None => {
                let idx = self.graph.add_node(data);
                self.index.insert(key, idx);
                idx
            }
        }
    }

    /// MERGE an edge. Returns false when an endpoint does not exist.
    fn merge_edge(&mut self, start: &NodeKey, end: &NodeKey, edge: EdgeData) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(start), self.index.get(end)) else {
            return false;
        };
        let existing = self
            .graph
            .edges_connecting(a, b)
            .find(|e| e.weight().rel_type == edge.rel_type)
            .map(|e| e.id());
        match existing {
            Some(id) => {
                // Columns left empty are unset, as SET to null does
                if let Some(weight) = self.graph.edge_weight_mut(id) {
                    weight.properties = edge.properties;
                }
            }
            None => {
                self.graph.add_edge(a, b, edge);
            }
        }
        true
    }

    /// Point the `rel_type` edge of `start` at `end` only, dropping edges of
    /// that type to any other node.
    fn replace_context_edge(&mut self, start: &NodeKey, rel_type: &str, end: &NodeKey) {
        let Some(&a) = self.index.get(start) else {
            return;
        };
        let target = self.index.get(end).copied();
        let stale: Vec<_> = self
            .graph
            .edges_directed(a, EdgeDirection::Outgoing)
            .filter(|e| e.weight().rel_type == rel_type && Some(e.target()) != target)
            .map(|e| e.id())
            .collect();
        for id in stale {
            self.graph.remove_edge(id);
        }
        self.merge_edge(start, end, EdgeData::bare(rel_type));
    }

    /// Apply one validated row. Returns whether it matched.
    fn apply(&mut self, op: RowOp) -> bool {
        match op {
            RowOp::Node { key, data } => {
                let context = match &data {
                    NodeData::Concept(concept) => Some((
                        key.clone(),
                        NodeKey::Domain(concept.properties.domain_id.clone()),
                        NodeKey::Vocabulary(concept.properties.vocabulary_id.clone()),
                    )),
                    _ => None,
                };
                self.upsert_node(key, data);
                if let Some((concept, domain, vocabulary)) = context {
                    self.replace_context_edge(&concept, IN_DOMAIN, &domain);
                    self.replace_context_edge(&concept, FROM_VOCABULARY, &vocabulary);
                }
                true
            }
            RowOp::Edge { start, end, edge } => self.merge_edge(&start, &end, edge),
        }
    }
}

impl EdgeData {
    fn bare(rel_type: &str) -> Self {
        Self {
            rel_type: rel_type.to_string(),
            properties: BTreeMap::new(),
        }
    }
}

// ============================================================================
// Row parsing
// ============================================================================

enum RowOp {
    Node { key: NodeKey, data: NodeData },
    Edge { start: NodeKey, end: NodeKey, edge: EdgeData },
}

/// Column positions for one record file, resolved from its header row.
struct RowParser {
    file: RecordFile,
    positions: HashMap<&'static str, usize>,
}

impl RowParser {
    fn new(file: RecordFile, headers: &StringRecord) -> Result<Self, String> {
        let mut positions = HashMap::new();
        for column in file.header() {
            let pos = headers
                .iter()
                .position(|h| h.trim() == *column)
                .ok_or_else(|| format!("missing column '{}'", column))?;
            positions.insert(*column, pos);
        }
        Ok(Self { file, positions })
    }

    fn text<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.positions
            .get(column)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn owned(&self, record: &StringRecord, column: &str) -> String {
        self.text(record, column).to_string()
    }

    fn optional(&self, record: &StringRecord, column: &str) -> Option<String> {
        let value = self.text(record, column);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn integer(&self, record: &StringRecord, column: &str) -> Result<i64, String> {
        let value = self.text(record, column);
        value
            .parse()
            .map_err(|_| format!("{} is not an integer: '{}'", column, value))
    }

    fn date(&self, record: &StringRecord, column: &str) -> Result<Option<NaiveDate>, String> {
        let value = self.text(record, column);
        if value.is_empty() {
            return Ok(None);
        }
        parse_record_date(value)
            .map(Some)
            .ok_or_else(|| format!("{} is not a date: '{}'", column, value))
    }

    fn parse(&self, record: &StringRecord) -> Result<RowOp, String> {
        match self.file {
            RecordFile::DomainNodes => {
                let domain_id = self.owned(record, "domain_id:ID(Domain-ID)");
                Ok(RowOp::Node {
                    key: NodeKey::Domain(domain_id.clone()),
                    data: NodeData::Domain {
                        domain_id,
                        domain_name: self.owned(record, "domain_name:string"),
                        domain_concept_id: self.integer(record, "domain_concept_id:long")?,
                    },
                })
            }
            RecordFile::VocabularyNodes => {
                let vocabulary_id = self.owned(record, "vocabulary_id:ID(Vocabulary-ID)");
                Ok(RowOp::Node {
                    key: NodeKey::Vocabulary(vocabulary_id.clone()),
                    data: NodeData::Vocabulary {
                        vocabulary_id,
                        vocabulary_name: self.owned(record, "vocabulary_name:string"),
                        vocabulary_reference: self.owned(record, "vocabulary_reference:string"),
                        vocabulary_version: self.owned(record, "vocabulary_version:string"),
                        vocabulary_concept_id: self
                            .integer(record, "vocabulary_concept_id:long")?,
                    },
                })
            }
            RecordFile::ConceptNodes => {
                let concept_id = self.integer(record, "concept_id:long")?;
                let properties = ConceptProperties {
                    concept_id,
                    name: self.owned(record, "name:string"),
                    domain_id: self.owned(record, "domain_id:string"),
                    vocabulary_id: self.owned(record, "vocabulary_id:string"),
                    concept_class_id: self.owned(record, "concept_class_id:string"),
                    standard_concept: self.optional(record, "standard_concept:string"),
                    concept_code: self.owned(record, "concept_code:string"),
                    valid_start_date: self.date(record, "valid_start_date:date")?,
                    valid_end_date: self.date(record, "valid_end_date:date")?,
                    invalid_reason: self.optional(record, "invalid_reason:string"),
                };
                Ok(RowOp::Node {
                    key: NodeKey::Concept(concept_id),
                    data: NodeData::Concept(ConceptNode {
                        properties,
                        labels: LabelSet::from_field(self.text(record, ":LABEL")),
                        synonyms: parse_synonyms(self.text(record, "synonyms:string[]")),
                    }),
                })
            }
            RecordFile::InDomain | RecordFile::FromVocabulary => {
                Err(format!("{} is only read by the bulk importer", self.file))
            }
            RecordFile::Semantic | RecordFile::Ancestor => {
                let rel_type = self.text(record, ":TYPE");
                if rel_type.is_empty() {
                    return Err("empty relationship type".to_string());
                }
                let mut properties = BTreeMap::new();
                for &column in &self.file.header()[3..] {
                    let value = self.text(record, column);
                    if column.ends_with(":date") {
                        self.date(record, column)?;
                    } else if column.ends_with(":int") {
                        self.integer(record, column)?;
                    }
                    if !value.is_empty() {
                        let name = column.split(':').next().unwrap_or(column);
                        properties.insert(name.to_string(), value.to_string());
                    }
                }
                Ok(RowOp::Edge {
                    start: NodeKey::Concept(self.integer(record, ":START_ID(Concept-ID)")?),
                    end: NodeKey::Concept(self.integer(record, ":END_ID(Concept-ID)")?),
                    edge: EdgeData {
                        rel_type: rel_type.to_string(),
                        properties,
                    },
                })
            }
        }
    }
}

// ============================================================================
// Store
// ============================================================================

/// Graph store held entirely in memory.
#[derive(Default)]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().graph.edge_count()
    }

    /// Properties of a loaded relationship, keyed without the type suffix.
    pub fn relationship_properties(
        &self,
        start: i64,
        rel_type: &str,
        end: i64,
    ) -> Option<BTreeMap<String, String>> {
        let state = self.state.read();
        let a = *state.index.get(&NodeKey::Concept(start))?;
        let b = *state.index.get(&NodeKey::Concept(end))?;
        state
            .graph
            .edges_connecting(a, b)
            .find(|e| e.weight().rel_type == rel_type)
            .map(|e| e.weight().properties.clone())
    }

    fn apply_batch(&self, file: RecordFile, batch: usize, ops: Vec<RowOp>) -> u64 {
        let mut state = self.state.write();
        let mut applied = 0u64;
        for op in ops {
            if state.apply(op) {
                applied += 1;
            }
        }
        debug!("Committed batch {} of {} ({} rows applied)", batch, file, applied);
        applied
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    fn name(&self) -> &str {
        "memory"
    }

    async fn schema_catalog(&self) -> Result<Vec<SchemaObject>, StoreError> {
        Ok(self.state.read().schema.clone())
    }

    async fn drop_schema_object(&self, object: &SchemaObject) -> Result<(), StoreError> {
        self.state.write().schema.retain(|o| o != object);
        Ok(())
    }

    async fn create_schema_object(&self, definition: &SchemaDefinition) -> Result<(), StoreError> {
        let object = definition.as_object();
        let mut state = self.state.write();
        if !state.schema.iter().any(|o| o.name == object.name) {
            state.schema.push(object);
        }
        Ok(())
    }

    async fn delete_all(&self, _batch_size: usize) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.graph.clear();
        state.index.clear();
        Ok(())
    }

    async fn load_records(
        &self,
        source: &RecordSource,
        batch_size: usize,
    ) -> Result<u64, StoreError> {
        let file = source.file;
        if file.is_bulk_only() {
            return Err(StoreError::BulkOnly(file));
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&source.local_path)
            .map_err(|e| StoreError::RecordFile {
                path: source.local_path.clone(),
                source: e,
            })?;
        let headers = reader
            .headers()
            .map_err(|e| StoreError::RecordFile {
                path: source.local_path.clone(),
                source: e,
            })?
            .clone();
        let parser = RowParser::new(file, &headers).map_err(|m| StoreError::batch(file, 1, m))?;

        let batch_size = batch_size.max(1);
        let mut batch = 1usize;
        let mut pending = Vec::with_capacity(batch_size);
        let mut applied = 0u64;

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(|e| StoreError::batch(file, batch, e.to_string()))?;
            let op = parser
                .parse(&record)
                .map_err(|m| StoreError::batch(file, batch, format!("row {}: {}", row + 1, m)))?;
            pending.push(op);
            if pending.len() == batch_size {
                applied += self.apply_batch(file, batch, std::mem::take(&mut pending));
                batch += 1;
            }
        }
        if !pending.is_empty() {
            applied += self.apply_batch(file, batch, pending);
        }
        Ok(applied)
    }

    async fn node_label_counts(&self) -> Result<CountMap, StoreError> {
        let state = self.state.read();
        let mut counts = CountMap::new();
        for node in state.graph.node_weights() {
            *counts.entry(node.group_key()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn relationship_type_counts(&self) -> Result<CountMap, StoreError> {
        let state = self.state.read();
        let mut counts = CountMap::new();
        for edge in state.graph.edge_weights() {
            *counts.entry(edge.rel_type.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn probe_concept(
        &self,
        concept_id: i64,
        neighbor_sample: usize,
        group_limit: usize,
    ) -> Result<ProbeOutcome, StoreError> {
        let state = self.state.read();
        let Some(&idx) = state.index.get(&NodeKey::Concept(concept_id)) else {
            return Ok(ProbeOutcome::NotFound { concept_id });
        };
        let Some(NodeData::Concept(concept)) = state.graph.node_weight(idx) else {
            return Ok(ProbeOutcome::NotFound { concept_id });
        };

        let mut groups: BTreeMap<(String, Direction), Vec<String>> = BTreeMap::new();
        for (edge_direction, direction) in [
            (EdgeDirection::Outgoing, Direction::Outgoing),
            (EdgeDirection::Incoming, Direction::Incoming),
        ] {
            for edge in state.graph.edges_directed(idx, edge_direction) {
                // Self loops are reported once, as outgoing
                if direction == Direction::Incoming && edge.source() == edge.target() {
                    continue;
                }
                let neighbor = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                let name = state
                    .graph
                    .node_weight(neighbor)
                    .map(NodeData::display_name)
                    .unwrap_or_default();
                groups
                    .entry((edge.weight().rel_type.clone(), direction))
                    .or_default()
                    .push(name);
            }
        }

        let relationships = groups
            .into_iter()
            .take(group_limit)
            .map(|((rel_type, direction), mut names)| {
                names.sort();
                let count = names.len() as u64;
                names.truncate(neighbor_sample);
                RelationshipSummary {
                    rel_type,
                    direction,
                    count,
                    sample_neighbors: names,
                }
            })
            .collect();

        let mut labels: Vec<String> = concept.labels.iter().map(str::to_string).collect();
        labels.sort();

        Ok(ProbeOutcome::Found(Box::new(ConceptProbe {
            properties: concept.properties.clone(),
            labels,
            synonym_count: concept.synonyms.len(),
            synonyms: concept.synonyms.clone(),
            relationships,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    fn source(dir: &Path, file: RecordFile, rows: &[&str]) -> RecordSource {
        let path = dir.join(file.file_name());
        let mut content = file.header().join(",");
        content.push('\n');
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        RecordSource {
            file,
            local_path: path.clone(),
            uri: format!("file:///{}", file.file_name()),
        }
    }

    const CONCEPT_A: &str =
        "1,1,Concept|Drug|Standard,enalapril,Drug,SNOMED,Ingredient,S,3827,1970-01-01,2099-12-31,,Vasotec";
    const CONCEPT_B: &str =
        "2,2,Concept|Condition,hypertension,Condition,SNOMED,Finding,,38341003,1970-01-01,2099-12-31,,";

    async fn seeded(dir: &Path) -> MemoryGraph {
        let store = MemoryGraph::new();
        let domains = source(
            dir,
            RecordFile::DomainNodes,
            &["Drug,Domain,Drug,13", "Condition,Domain,Condition,19"],
        );
        let vocabs = source(
            dir,
            RecordFile::VocabularyNodes,
            &["SNOMED,Vocabulary,SNOMED CT,ref,v1,44819097"],
        );
        let concepts = source(dir, RecordFile::ConceptNodes, &[CONCEPT_A, CONCEPT_B]);
        for src in [domains, vocabs, concepts] {
            store.load_records(&src, 10).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_concepts_attach_to_reference_nodes() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;

        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get(IN_DOMAIN), Some(&2));
        assert_eq!(rels.get(FROM_VOCABULARY), Some(&2));

        let nodes = store.node_label_counts().await.unwrap();
        assert_eq!(nodes.get("Concept:Drug:Standard"), Some(&1));
        assert_eq!(nodes.get("Concept:Condition"), Some(&1));
        assert_eq!(nodes.get("Domain"), Some(&2));
    }

    #[tokio::test]
    async fn test_edges_merge_on_reload() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let semantic = source(
            temp.path(),
            RecordFile::Semantic,
            &["1,2,TREATS,treats,1970-01-01,2099-12-31,"],
        );

        assert_eq!(store.load_records(&semantic, 1).await.unwrap(), 1);
        assert_eq!(store.load_records(&semantic, 1).await.unwrap(), 1);

        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get("TREATS"), Some(&1));
        let props = store.relationship_properties(1, "TREATS", 2).unwrap();
        assert_eq!(props.get("relationship_id").map(String::as_str), Some("treats"));
        assert!(!props.contains_key("invalid_reason"));
    }

    #[tokio::test]
    async fn test_edge_reload_takes_new_properties() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let first = source(
            temp.path(),
            RecordFile::Semantic,
            &["1,2,MAPS_TO,Maps to,1970-01-01,2099-12-31,D"],
        );
        store.load_records(&first, 10).await.unwrap();

        let second = source(
            temp.path(),
            RecordFile::Semantic,
            &["1,2,MAPS_TO,Maps to,1970-01-01,2099-12-31,"],
        );
        store.load_records(&second, 10).await.unwrap();

        let props = store.relationship_properties(1, "MAPS_TO", 2).unwrap();
        assert!(!props.contains_key("invalid_reason"), "{props:?}");
        assert_eq!(
            props.get("valid_start_date").map(String::as_str),
            Some("1970-01-01")
        );
    }

    #[tokio::test]
    async fn test_concept_reload_moves_domain() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let moved = source(
            temp.path(),
            RecordFile::ConceptNodes,
            &["1,1,Concept|Condition,enalapril,Condition,SNOMED,Ingredient,,3827,1970-01-01,2099-12-31,,"],
        );
        store.load_records(&moved, 10).await.unwrap();

        let nodes = store.node_label_counts().await.unwrap();
        assert_eq!(nodes.get("Concept:Drug:Standard"), None);
        assert_eq!(nodes.get("Concept:Condition"), Some(&2));
        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get(IN_DOMAIN), Some(&2));
        assert_eq!(rels.get(FROM_VOCABULARY), Some(&2));

        let probe = store.probe_concept(1, 3, 25).await.unwrap();
        let probe = probe.found().unwrap();
        assert_eq!(probe.labels, vec!["Concept", "Condition"]);
        assert!(probe.synonyms.is_empty());
        let domain = probe.relationship(IN_DOMAIN, Direction::Outgoing).unwrap();
        assert_eq!(domain.sample_neighbors, vec!["Condition"]);
    }

    #[tokio::test]
    async fn test_unpadded_date_fails_batch() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let semantic = source(
            temp.path(),
            RecordFile::Semantic,
            &["1,2,MAPS_TO,Maps to,2020-1-5,2099-12-31,"],
        );

        let err = store.load_records(&semantic, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::Batch { batch: 1, .. }), "{err}");
        assert!(err.to_string().contains("2020-1-5"));
    }

    #[tokio::test]
    async fn test_contextual_edge_files_are_rejected() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let in_domain = source(temp.path(), RecordFile::InDomain, &["1,Drug,IN_DOMAIN"]);

        let err = store.load_records(&in_domain, 10).await.unwrap_err();
        assert!(matches!(err, StoreError::BulkOnly(RecordFile::InDomain)), "{err}");
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_skipped() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let ancestors = source(temp.path(), RecordFile::Ancestor, &["1,2,HAS_ANCESTOR,1,1", "1,99,HAS_ANCESTOR,1,2"]);

        assert_eq!(store.load_records(&ancestors, 10).await.unwrap(), 1);
        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get("HAS_ANCESTOR"), Some(&1));
    }

    #[tokio::test]
    async fn test_failed_batch_keeps_earlier_batches() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let ancestors = source(
            temp.path(),
            RecordFile::Ancestor,
            &["1,2,HAS_ANCESTOR,1,1", "2,1,HAS_ANCESTOR,x,1"],
        );

        let err = store.load_records(&ancestors, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::Batch { batch: 2, .. }), "{err}");
        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get("HAS_ANCESTOR"), Some(&1));
    }

    #[tokio::test]
    async fn test_failed_batch_applies_nothing_from_itself() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let ancestors = source(
            temp.path(),
            RecordFile::Ancestor,
            &["1,2,HAS_ANCESTOR,1,1", "2,1,HAS_ANCESTOR,x,1"],
        );

        assert!(store.load_records(&ancestors, 10).await.is_err());
        let rels = store.relationship_type_counts().await.unwrap();
        assert_eq!(rels.get("HAS_ANCESTOR"), None);
    }

    #[tokio::test]
    async fn test_probe_groups_by_type_and_direction() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        let semantic = source(
            temp.path(),
            RecordFile::Semantic,
            &["1,2,TREATS,treats,,,", "2,1,TREATED_BY,treated by,,,"],
        );
        store.load_records(&semantic, 10).await.unwrap();

        let outcome = store.probe_concept(1, 3, 25).await.unwrap();
        let probe = outcome.found().unwrap();
        assert_eq!(probe.labels, vec!["Concept", "Drug", "Standard"]);
        assert_eq!(probe.synonyms, vec!["Vasotec"]);
        assert_eq!(probe.properties.standard_concept.as_deref(), Some("S"));

        let treats = probe.relationship("TREATS", Direction::Outgoing).unwrap();
        assert_eq!(treats.sample_neighbors, vec!["hypertension"]);
        let treated_by = probe.relationship("TREATED_BY", Direction::Incoming).unwrap();
        assert_eq!(treated_by.count, 1);
        let domain = probe.relationship(IN_DOMAIN, Direction::Outgoing).unwrap();
        assert_eq!(domain.sample_neighbors, vec!["Drug"]);
    }

    #[tokio::test]
    async fn test_probe_limits_groups() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;

        let outcome = store.probe_concept(1, 3, 1).await.unwrap();
        assert_eq!(outcome.found().unwrap().relationships.len(), 1);
    }

    #[tokio::test]
    async fn test_probe_missing_concept() {
        let store = MemoryGraph::new();
        assert_eq!(
            store.probe_concept(42, 3, 25).await.unwrap(),
            ProbeOutcome::NotFound { concept_id: 42 }
        );
    }

    #[tokio::test]
    async fn test_delete_all_keeps_schema() {
        let temp = TempDir::new().unwrap();
        let store = seeded(temp.path()).await;
        store
            .create_schema_object(&crate::types::REQUIRED_SCHEMA[0])
            .await
            .unwrap();

        store.delete_all(10).await.unwrap();

        assert_eq!(store.node_count(), 0);
        assert_eq!(store.edge_count(), 0);
        assert_eq!(store.schema_catalog().await.unwrap().len(), 1);
    }
}
