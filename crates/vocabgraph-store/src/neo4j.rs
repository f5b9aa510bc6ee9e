//! Neo4j implementation of [`GraphStore`].
//!
//! Uses the Bolt protocol through `neo4rs`. Record files are read by the
//! server itself, so the configured import URI prefix must resolve to the
//! directory the transformer wrote into.

use async_trait::async_trait;
use chrono::NaiveDate;
use neo4rs::{query, ConfigBuilder, Graph, Query};
use tracing::{debug, info};

use crate::cypher;
use crate::error::StoreError;
use crate::traits::GraphStore;
use crate::types::{
    ConceptProbe, ConceptProperties, CountMap, Direction, ProbeOutcome, RecordSource,
    RelationshipSummary, SchemaDefinition, SchemaKind, SchemaObject,
};
use vocabgraph_core::LabelSet;

/// Connection settings for [`Neo4jStore`].
#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: usize,
    pub fetch_size: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            max_connections: 4,
            fetch_size: 500,
        }
    }
}

impl Neo4jSettings {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_pool(mut self, max_connections: usize, fetch_size: usize) -> Self {
        self.max_connections = max_connections;
        self.fetch_size = fetch_size;
        self
    }
}

/// Graph store backed by a Neo4j server.
pub struct Neo4jStore {
    graph: Graph,
    database: String,
}

impl Neo4jStore {
    /// Connect and verify the server answers a trivial query.
    pub async fn connect(settings: &Neo4jSettings) -> Result<Self, StoreError> {
        info!(
            "Connecting to Neo4j at {} (database: {})",
            settings.uri, settings.database
        );

        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .max_connections(settings.max_connections)
            .fetch_size(settings.fetch_size)
            .build()
            .map_err(|e| StoreError::connection(format!("invalid Neo4j settings: {}", e)))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| StoreError::connection(format!("{}: {}", settings.uri, e)))?;

        let store = Self {
            graph,
            database: settings.database.clone(),
        };
        store
            .graph
            .run(query("RETURN 1"))
            .await
            .map_err(|e| StoreError::connection(format!("{}: {}", settings.uri, e)))?;

        info!("Connected to Neo4j");
        Ok(store)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Run a query and collect every row through `decode`.
    async fn fetch<T>(
        &self,
        context: &str,
        q: Query,
        mut decode: impl FnMut(&neo4rs::Row) -> Result<T, StoreError>,
    ) -> Result<Vec<T>, StoreError> {
        let mut stream = self
            .graph
            .execute(q)
            .await
            .map_err(|e| StoreError::query(context, e))?;

        let mut rows = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| StoreError::query(context, e))?
        {
            rows.push(decode(&row)?);
        }
        Ok(rows)
    }

    async fn fetch_concept(&self, concept_id: i64) -> Result<Option<ConceptProbe>, StoreError> {
        let q = query(cypher::PROBE_CONCEPT).param("concept_id", concept_id);
        let mut found = self.fetch("probe concept", q, decode_concept).await?;
        Ok(found.pop())
    }

    async fn fetch_relationships(
        &self,
        concept_id: i64,
        neighbor_sample: usize,
        group_limit: usize,
    ) -> Result<Vec<RelationshipSummary>, StoreError> {
        let q = query(cypher::PROBE_RELATIONSHIPS)
            .param("concept_id", concept_id)
            .param("neighbor_sample", to_param(neighbor_sample))
            .param("group_limit", to_param(group_limit));

        self.fetch("probe relationships", q, |row| {
            let outgoing: bool = get(row, "probe relationships", "outgoing")?;
            let count: i64 = get(row, "probe relationships", "count")?;
            Ok(RelationshipSummary {
                rel_type: get(row, "probe relationships", "rel_type")?,
                direction: if outgoing {
                    Direction::Outgoing
                } else {
                    Direction::Incoming
                },
                count: count.max(0) as u64,
                sample_neighbors: get(row, "probe relationships", "neighbors")?,
            })
        })
        .await
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn schema_catalog(&self) -> Result<Vec<SchemaObject>, StoreError> {
        let mut objects = self
            .fetch("list constraints", query(cypher::SHOW_CONSTRAINTS), |row| {
                Ok(SchemaObject::constraint(get::<String>(
                    row,
                    "list constraints",
                    "name",
                )?))
            })
            .await?;

        let indexes = self
            .fetch("list indexes", query(cypher::SHOW_INDEXES), |row| {
                let name: String = get(row, "list indexes", "name")?;
                let index_type: String = get(row, "list indexes", "type")?;
                let owner: Option<String> = row.get("owningConstraint").ok();
                Ok((name, index_type, owner))
            })
            .await?;

        objects.extend(
            indexes
                .into_iter()
                .filter(|(_, index_type, owner)| {
                    !index_type.eq_ignore_ascii_case("LOOKUP") && owner.is_none()
                })
                .map(|(name, _, _)| SchemaObject::index(name)),
        );
        Ok(objects)
    }

    async fn drop_schema_object(&self, object: &SchemaObject) -> Result<(), StoreError> {
        let statement = match object.kind {
            SchemaKind::Constraint => cypher::drop_constraint(&object.name),
            SchemaKind::Index => cypher::drop_index(&object.name),
        };
        debug!("Dropping {} {}", object.kind, object.name);
        self.graph
            .run(query(&statement))
            .await
            .map_err(|e| StoreError::query(format!("drop {} {}", object.kind, object.name), e))
    }

    async fn create_schema_object(&self, definition: &SchemaDefinition) -> Result<(), StoreError> {
        debug!("Creating {} {}", definition.kind, definition.name);
        self.graph
            .run(query(&definition.create_statement()))
            .await
            .map_err(|e| {
                StoreError::query(format!("create {} {}", definition.kind, definition.name), e)
            })
    }

    async fn delete_all(&self, batch_size: usize) -> Result<(), StoreError> {
        let q = query(cypher::DELETE_ALL).param("batch_size", to_param(batch_size));
        self.graph
            .run(q)
            .await
            .map_err(|e| StoreError::query("delete all", e))
    }

    async fn load_records(
        &self,
        source: &RecordSource,
        batch_size: usize,
    ) -> Result<u64, StoreError> {
        let statement =
            cypher::load_statement(source.file).ok_or(StoreError::BulkOnly(source.file))?;
        debug!(
            "Loading {} from {} in batches of {}",
            source.file, source.uri, batch_size
        );
        let q = query(statement)
            .param("uri", source.uri.as_str())
            .param("batch_size", to_param(batch_size));

        let context = format!("load {}", source.file);
        let counts = self
            .fetch(&context, q, |row| get::<i64>(row, &context, "rows"))
            .await?;
        Ok(counts.into_iter().map(|n| n.max(0) as u64).sum())
    }

    async fn node_label_counts(&self) -> Result<CountMap, StoreError> {
        let rows = self
            .fetch("count nodes", query(cypher::NODE_LABEL_COUNTS), |row| {
                let labels: Vec<String> = get(row, "count nodes", "labels")?;
                let count: i64 = get(row, "count nodes", "count")?;
                Ok((labels.into_iter().collect::<LabelSet>().group_key(), count))
            })
            .await?;

        let mut counts = CountMap::new();
        for (key, count) in rows {
            *counts.entry(key).or_insert(0) += count.max(0) as u64;
        }
        Ok(counts)
    }

    async fn relationship_type_counts(&self) -> Result<CountMap, StoreError> {
        let rows = self
            .fetch(
                "count relationships",
                query(cypher::RELATIONSHIP_TYPE_COUNTS),
                |row| {
                    let rel_type: String = get(row, "count relationships", "rel_type")?;
                    let count: i64 = get(row, "count relationships", "count")?;
                    Ok((rel_type, count.max(0) as u64))
                },
            )
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn probe_concept(
        &self,
        concept_id: i64,
        neighbor_sample: usize,
        group_limit: usize,
    ) -> Result<ProbeOutcome, StoreError> {
        let Some(mut probe) = self.fetch_concept(concept_id).await? else {
            return Ok(ProbeOutcome::NotFound { concept_id });
        };
        probe.relationships = self
            .fetch_relationships(concept_id, neighbor_sample, group_limit)
            .await?;
        Ok(ProbeOutcome::Found(Box::new(probe)))
    }
}

/// Bolt integers are signed 64-bit.
fn to_param(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn get<T>(row: &neo4rs::Row, context: &str, column: &str) -> Result<T, StoreError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    row.get::<T>(column)
        .map_err(|e| StoreError::decode(context, format!("column '{}': {}", column, e)))
}

fn optional_text(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn optional_date(value: &str, column: &str) -> Result<Option<NaiveDate>, StoreError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| StoreError::decode("probe concept", format!("{} '{}': {}", column, value, e)))
}

fn decode_concept(row: &neo4rs::Row) -> Result<ConceptProbe, StoreError> {
    const CTX: &str = "probe concept";
    let start: String = get(row, CTX, "valid_start_date")?;
    let end: String = get(row, CTX, "valid_end_date")?;
    let synonyms: Vec<String> = get(row, CTX, "synonyms")?;

    let properties = ConceptProperties {
        concept_id: get(row, CTX, "concept_id")?,
        name: get(row, CTX, "name")?,
        domain_id: get(row, CTX, "domain_id")?,
        vocabulary_id: get(row, CTX, "vocabulary_id")?,
        concept_class_id: get(row, CTX, "concept_class_id")?,
        standard_concept: optional_text(get(row, CTX, "standard_concept")?),
        concept_code: get(row, CTX, "concept_code")?,
        valid_start_date: optional_date(&start, "valid_start_date")?,
        valid_end_date: optional_date(&end, "valid_end_date")?,
        invalid_reason: optional_text(get(row, CTX, "invalid_reason")?),
    };

    let mut labels: Vec<String> = get(row, CTX, "labels")?;
    labels.sort();

    Ok(ConceptProbe {
        properties,
        labels,
        synonym_count: synonyms.len(),
        synonyms,
        relationships: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_builders() {
        let settings = Neo4jSettings::new("bolt://db:7687")
            .with_credentials("reader", "secret")
            .with_database("vocab")
            .with_pool(8, 1000);
        assert_eq!(settings.uri, "bolt://db:7687");
        assert_eq!(settings.user, "reader");
        assert_eq!(settings.database, "vocab");
        assert_eq!(settings.max_connections, 8);
        assert_eq!(settings.fetch_size, 1000);
    }

    #[test]
    fn test_optional_date() {
        assert_eq!(optional_date("", "d").unwrap(), None);
        assert_eq!(
            optional_date("1970-01-01", "d").unwrap(),
            NaiveDate::from_ymd_opt(1970, 1, 1)
        );
        assert!(optional_date("01/01/1970", "d").is_err());
    }

    #[test]
    fn test_to_param_saturates() {
        assert_eq!(to_param(10_000), 10_000);
        assert_eq!(to_param(usize::MAX), i64::MAX);
    }

    #[tokio::test]
    #[ignore] // Requires Neo4j running
    async fn test_connect_and_count() {
        let password = std::env::var("NEO4J_PASSWORD").unwrap_or_default();
        let store = Neo4jStore::connect(
            &Neo4jSettings::default().with_credentials("neo4j", password),
        )
        .await
        .unwrap();
        store.node_label_counts().await.unwrap();
    }
}
