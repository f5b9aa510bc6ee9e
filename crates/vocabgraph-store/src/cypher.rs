//! Cypher statements for the Neo4j store.
//!
//! Record files are applied server-side with `LOAD CSV` and committed with
//! `CALL { ... } IN TRANSACTIONS OF $batch_size ROWS`, so each batch is its
//! own transaction. Every write is a MERGE by identifier, which makes a
//! repeated load without clearing converge on the same graph.
//!
//! Dynamic labels and relationship types need the APOC plugin.

use vocabgraph_core::RecordFile;

/// Empty CSV fields arrive as null or `''`; both become null.
macro_rules! nullable {
    ($field:literal) => {
        concat!("CASE WHEN coalesce(", $field, ", '') = '' THEN null ELSE ", $field, " END")
    };
}

/// Date column or null.
macro_rules! nullable_date {
    ($field:literal) => {
        concat!("CASE WHEN coalesce(", $field, ", '') = '' THEN null ELSE date(", $field, ") END")
    };
}

pub const LOAD_DOMAINS: &str = concat!(
    "LOAD CSV WITH HEADERS FROM $uri AS row ",
    "CALL { WITH row ",
    "MERGE (d:Domain {domain_id: row.`domain_id:ID(Domain-ID)`}) ",
    "SET d.domain_name = row.`domain_name:string`, ",
    "d.domain_concept_id = toInteger(row.`domain_concept_id:long`) ",
    "RETURN 1 AS applied ",
    "} IN TRANSACTIONS OF $batch_size ROWS ",
    "RETURN count(applied) AS rows"
);

pub const LOAD_VOCABULARIES: &str = concat!(
    "LOAD CSV WITH HEADERS FROM $uri AS row ",
    "CALL { WITH row ",
    "MERGE (v:Vocabulary {vocabulary_id: row.`vocabulary_id:ID(Vocabulary-ID)`}) ",
    "SET v.vocabulary_name = row.`vocabulary_name:string`, ",
    "v.vocabulary_reference = row.`vocabulary_reference:string`, ",
    "v.vocabulary_version = row.`vocabulary_version:string`, ",
    "v.vocabulary_concept_id = toInteger(row.`vocabulary_concept_id:long`) ",
    "RETURN 1 AS applied ",
    "} IN TRANSACTIONS OF $batch_size ROWS ",
    "RETURN count(applied) AS rows"
);

/// Concept node plus both contextual edges, in the same batch transaction.
/// Labels and contextual edges are replaced, not accumulated, so a concept
/// that moved domain keeps exactly one domain label and `IN_DOMAIN` edge.
/// Edges only attach to reference nodes that already exist.
pub const LOAD_CONCEPTS: &str = concat!(
    "LOAD CSV WITH HEADERS FROM $uri AS row ",
    "CALL { WITH row ",
    "MERGE (c:Concept {concept_id: toInteger(row.`concept_id:long`)}) ",
    "SET c.name = row.`name:string`, ",
    "c.domain_id = row.`domain_id:string`, ",
    "c.vocabulary_id = row.`vocabulary_id:string`, ",
    "c.concept_class_id = row.`concept_class_id:string`, ",
    "c.standard_concept = ",
    nullable!("row.`standard_concept:string`"),
    ", c.concept_code = row.`concept_code:string`, ",
    "c.valid_start_date = ",
    nullable_date!("row.`valid_start_date:date`"),
    ", c.valid_end_date = ",
    nullable_date!("row.`valid_end_date:date`"),
    ", c.invalid_reason = ",
    nullable!("row.`invalid_reason:string`"),
    ", c.synonyms = CASE WHEN coalesce(row.`synonyms:string[]`, '') = '' THEN [] ",
    "ELSE split(row.`synonyms:string[]`, '|') END ",
    "WITH c, row ",
    "CALL apoc.create.removeLabels(c, ",
    "[l IN labels(c) WHERE NOT l IN split(row.`:LABEL`, '|')]) YIELD node AS trimmed ",
    "CALL apoc.create.addLabels(c, split(row.`:LABEL`, '|')) YIELD node ",
    "CALL { WITH c, row ",
    "MATCH (c)-[old:IN_DOMAIN]->(d) WHERE d.domain_id <> row.`domain_id:string` ",
    "DELETE old } ",
    "CALL { WITH c, row ",
    "MATCH (c)-[old:FROM_VOCABULARY]->(v) WHERE v.vocabulary_id <> row.`vocabulary_id:string` ",
    "DELETE old } ",
    "CALL { WITH c, row ",
    "MATCH (d:Domain {domain_id: row.`domain_id:string`}) ",
    "MERGE (c)-[:IN_DOMAIN]->(d) } ",
    "CALL { WITH c, row ",
    "MATCH (v:Vocabulary {vocabulary_id: row.`vocabulary_id:string`}) ",
    "MERGE (c)-[:FROM_VOCABULARY]->(v) } ",
    "RETURN 1 AS applied ",
    "} IN TRANSACTIONS OF $batch_size ROWS ",
    "RETURN count(applied) AS rows"
);

pub const LOAD_SEMANTIC: &str = concat!(
    "LOAD CSV WITH HEADERS FROM $uri AS row ",
    "CALL { WITH row ",
    "MATCH (a:Concept {concept_id: toInteger(row.`:START_ID(Concept-ID)`)}) ",
    "MATCH (b:Concept {concept_id: toInteger(row.`:END_ID(Concept-ID)`)}) ",
    "CALL apoc.merge.relationship(a, row.`:TYPE`, {}, {}, b, {}) YIELD rel ",
    "SET rel.relationship_id = row.`relationship_id:string`, ",
    "rel.valid_start_date = ",
    nullable_date!("row.`valid_start_date:date`"),
    ", rel.valid_end_date = ",
    nullable_date!("row.`valid_end_date:date`"),
    ", rel.invalid_reason = ",
    nullable!("row.`invalid_reason:string`"),
    " RETURN 1 AS applied ",
    "} IN TRANSACTIONS OF $batch_size ROWS ",
    "RETURN count(applied) AS rows"
);

pub const LOAD_ANCESTORS: &str = concat!(
    "LOAD CSV WITH HEADERS FROM $uri AS row ",
    "CALL { WITH row ",
    "MATCH (d:Concept {concept_id: toInteger(row.`:START_ID(Concept-ID)`)}) ",
    "MATCH (a:Concept {concept_id: toInteger(row.`:END_ID(Concept-ID)`)}) ",
    "MERGE (d)-[r:HAS_ANCESTOR]->(a) ",
    "SET r.min_levels = toInteger(row.`min_levels:int`), ",
    "r.max_levels = toInteger(row.`max_levels:int`) ",
    "RETURN 1 AS applied ",
    "} IN TRANSACTIONS OF $batch_size ROWS ",
    "RETURN count(applied) AS rows"
);

/// Statement that applies `file`. Bulk-only files have none.
pub fn load_statement(file: RecordFile) -> Option<&'static str> {
    match file {
        RecordFile::DomainNodes => Some(LOAD_DOMAINS),
        RecordFile::VocabularyNodes => Some(LOAD_VOCABULARIES),
        RecordFile::ConceptNodes => Some(LOAD_CONCEPTS),
        RecordFile::Semantic => Some(LOAD_SEMANTIC),
        RecordFile::Ancestor => Some(LOAD_ANCESTORS),
        RecordFile::InDomain | RecordFile::FromVocabulary => None,
    }
}

pub const DELETE_ALL: &str =
    "MATCH (n) CALL { WITH n DETACH DELETE n } IN TRANSACTIONS OF $batch_size ROWS";

pub const SHOW_CONSTRAINTS: &str = "SHOW CONSTRAINTS YIELD name RETURN name";

pub const SHOW_INDEXES: &str =
    "SHOW INDEXES YIELD name, type, owningConstraint RETURN name, type, owningConstraint";

pub const NODE_LABEL_COUNTS: &str = "MATCH (n) RETURN labels(n) AS labels, count(*) AS count";

pub const RELATIONSHIP_TYPE_COUNTS: &str =
    "MATCH ()-[r]->() RETURN type(r) AS rel_type, count(*) AS count";

pub const PROBE_CONCEPT: &str = concat!(
    "MATCH (c:Concept {concept_id: $concept_id}) ",
    "RETURN c.concept_id AS concept_id, ",
    "coalesce(c.name, '') AS name, ",
    "coalesce(c.domain_id, '') AS domain_id, ",
    "coalesce(c.vocabulary_id, '') AS vocabulary_id, ",
    "coalesce(c.concept_class_id, '') AS concept_class_id, ",
    "coalesce(c.standard_concept, '') AS standard_concept, ",
    "coalesce(c.concept_code, '') AS concept_code, ",
    "coalesce(toString(c.valid_start_date), '') AS valid_start_date, ",
    "coalesce(toString(c.valid_end_date), '') AS valid_end_date, ",
    "coalesce(c.invalid_reason, '') AS invalid_reason, ",
    "labels(c) AS labels, ",
    "coalesce(c.synonyms, []) AS synonyms"
);

/// Incident relationships grouped by (type, direction) with sorted neighbor names.
pub const PROBE_RELATIONSHIPS: &str = concat!(
    "MATCH (c:Concept {concept_id: $concept_id})-[r]-(n) ",
    "WITH type(r) AS rel_type, startNode(r) = c AS outgoing, ",
    "coalesce(n.name, n.domain_name, n.vocabulary_name, ",
    "toString(n.concept_id), n.domain_id, n.vocabulary_id, '') AS neighbor ",
    "ORDER BY neighbor ",
    "WITH rel_type, outgoing, count(*) AS count, collect(neighbor) AS neighbors ",
    "RETURN rel_type, outgoing, count, neighbors[..$neighbor_sample] AS neighbors ",
    "ORDER BY rel_type, outgoing DESC ",
    "LIMIT $group_limit"
);

/// Backtick-quote a schema object name for DROP statements.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn drop_constraint(name: &str) -> String {
    format!("DROP CONSTRAINT {} IF EXISTS", quote_identifier(name))
}

pub fn drop_index(name: &str) -> String {
    format!("DROP INDEX {} IF EXISTS", quote_identifier(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_load_statement_is_batched() {
        for file in RecordFile::ALL {
            let Some(stmt) = load_statement(file) else {
                assert!(file.is_bulk_only(), "{file}");
                continue;
            };
            assert!(stmt.starts_with("LOAD CSV WITH HEADERS FROM $uri"), "{file}");
            assert!(
                stmt.contains("IN TRANSACTIONS OF $batch_size ROWS"),
                "{file}"
            );
            assert!(stmt.ends_with("RETURN count(applied) AS rows"), "{file}");
            assert!(!stmt.contains("CREATE ("), "{file} must upsert");
        }
    }

    #[test]
    fn test_load_statements_reference_header_columns() {
        for file in RecordFile::ALL {
            let Some(stmt) = load_statement(file) else {
                continue;
            };
            for column in file.header() {
                // Fixed types and reference labels are implied by the statement
                let implied = match *column {
                    ":TYPE" => file != RecordFile::Semantic,
                    ":LABEL" => file != RecordFile::ConceptNodes,
                    ":ID(Concept-ID)" => true,
                    _ => false,
                };
                if implied {
                    continue;
                }
                assert!(
                    stmt.contains(&format!("row.`{}`", column)),
                    "{file} ignores {column}"
                );
            }
        }
    }

    #[test]
    fn test_concept_reload_replaces_labels_and_context() {
        let remove = LOAD_CONCEPTS.find("apoc.create.removeLabels").unwrap();
        let add = LOAD_CONCEPTS.find("apoc.create.addLabels").unwrap();
        assert!(remove < add);

        let stale_domain = LOAD_CONCEPTS.find("[old:IN_DOMAIN]").unwrap();
        let merge_domain = LOAD_CONCEPTS.find("MERGE (c)-[:IN_DOMAIN]").unwrap();
        assert!(stale_domain < merge_domain);
        assert!(LOAD_CONCEPTS.contains("[old:FROM_VOCABULARY]"));
    }

    #[test]
    fn test_nullable_expansion() {
        assert_eq!(
            nullable!("row.x"),
            "CASE WHEN coalesce(row.x, '') = '' THEN null ELSE row.x END"
        );
    }

    #[test]
    fn test_drop_statements_quote_names() {
        assert_eq!(
            drop_constraint("constraint_concept_id"),
            "DROP CONSTRAINT `constraint_concept_id` IF EXISTS"
        );
        assert_eq!(drop_index("odd`name"), "DROP INDEX `odd``name` IF EXISTS");
    }
}
