//! Export statements and the file sink for raw table extracts.
//!
//! The database connection lives with the caller; this module only knows the
//! statements to stream and how to land their bytes safely. An extract file
//! that was not finished is deleted so the transformer never sees a partial
//! table.

use crate::error::ExtractError;
use crate::records::{
    ANCESTOR_EXTRACT, CONCEPT_EXTRACT, DOMAIN_EXTRACT, RELATIONSHIP_EXTRACT, VOCABULARY_EXTRACT,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

static SCHEMA_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("schema pattern is valid"));

/// Source tables, in extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractTable {
    Concepts,
    Domains,
    Vocabularies,
    ConceptRelationships,
    ConceptAncestors,
}

impl ExtractTable {
    pub const ALL: [ExtractTable; 5] = [
        ExtractTable::Concepts,
        ExtractTable::Domains,
        ExtractTable::Vocabularies,
        ExtractTable::ConceptRelationships,
        ExtractTable::ConceptAncestors,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExtractTable::Concepts => CONCEPT_EXTRACT,
            ExtractTable::Domains => DOMAIN_EXTRACT,
            ExtractTable::Vocabularies => VOCABULARY_EXTRACT,
            ExtractTable::ConceptRelationships => RELATIONSHIP_EXTRACT,
            ExtractTable::ConceptAncestors => ANCESTOR_EXTRACT,
        }
    }

    /// `SELECT` for this table with `{schema}` left as a placeholder.
    fn template(&self) -> &'static str {
        match self {
            // Synonyms are grouped here so every concept is exactly one row
            // and no chunk boundary can split a concept's synonyms.
            ExtractTable::Concepts => {
                "SELECT c.concept_id, c.concept_name, c.domain_id, c.vocabulary_id, \
                 c.concept_class_id, c.standard_concept, c.concept_code, \
                 to_char(c.valid_start_date, 'YYYY-MM-DD') AS valid_start_date, \
                 to_char(c.valid_end_date, 'YYYY-MM-DD') AS valid_end_date, \
                 c.invalid_reason, \
                 string_agg(cs.concept_synonym_name, '|') AS synonyms \
                 FROM {schema}.concept c \
                 LEFT JOIN {schema}.concept_synonym cs ON c.concept_id = cs.concept_id \
                 GROUP BY c.concept_id \
                 ORDER BY c.concept_id"
            }
            ExtractTable::Domains => {
                "SELECT domain_id, domain_name, domain_concept_id \
                 FROM {schema}.domain ORDER BY domain_id"
            }
            ExtractTable::Vocabularies => {
                "SELECT vocabulary_id, vocabulary_name, vocabulary_reference, \
                 vocabulary_version, vocabulary_concept_id \
                 FROM {schema}.vocabulary ORDER BY vocabulary_id"
            }
            ExtractTable::ConceptRelationships => {
                "SELECT concept_id_1, concept_id_2, relationship_id, \
                 to_char(valid_start_date, 'YYYY-MM-DD') AS valid_start_date, \
                 to_char(valid_end_date, 'YYYY-MM-DD') AS valid_end_date, \
                 invalid_reason \
                 FROM {schema}.concept_relationship"
            }
            ExtractTable::ConceptAncestors => {
                "SELECT descendant_concept_id, ancestor_concept_id, \
                 min_levels_of_separation, max_levels_of_separation \
                 FROM {schema}.concept_ancestor"
            }
        }
    }

    /// Query against `schema`. The schema must be a plain identifier.
    pub fn query(&self, schema: &str) -> Result<String, ExtractError> {
        if !SCHEMA_NAME.is_match(schema) {
            return Err(ExtractError::InvalidSchema(schema.to_string()));
        }
        Ok(self.template().replace("{schema}", schema))
    }

    /// `COPY ... TO STDOUT` statement producing a quoted, header-bearing CSV.
    pub fn copy_statement(&self, schema: &str) -> Result<String, ExtractError> {
        Ok(format!(
            "COPY ({}) TO STDOUT WITH CSV HEADER FORCE QUOTE *",
            self.query(schema)?
        ))
    }
}

/// Writes one extract file and removes it unless [`finish`](Self::finish) succeeds.
pub struct ExtractFileWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    bytes: u64,
    finished: bool,
}

impl ExtractFileWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ExtractError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ExtractError::Create {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = File::create(&path).map_err(|source| ExtractError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            bytes: 0,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_chunk(&mut self, bytes: &[u8]) -> Result<(), ExtractError> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        writer.write_all(bytes).map_err(|source| ExtractError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.bytes += bytes.len() as u64;
        Ok(())
    }

    /// Flush and keep the file. Returns the bytes written.
    pub fn finish(mut self) -> Result<u64, ExtractError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|source| ExtractError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        self.finished = true;
        debug!("Finished {:?} ({} bytes)", self.path, self.bytes);
        Ok(self.bytes)
    }
}

impl Drop for ExtractFileWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        drop(self.writer.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!("Removed partial extract {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove partial extract {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_statement_substitutes_schema() {
        let sql = ExtractTable::ConceptAncestors
            .copy_statement("cdm_v5")
            .unwrap();
        assert!(sql.starts_with("COPY (SELECT descendant_concept_id"));
        assert!(sql.contains("FROM cdm_v5.concept_ancestor"));
        assert!(sql.ends_with("TO STDOUT WITH CSV HEADER FORCE QUOTE *"));
    }

    #[test]
    fn test_concept_query_groups_synonyms() {
        let sql = ExtractTable::Concepts.query("cdm").unwrap();
        assert!(sql.contains("string_agg(cs.concept_synonym_name, '|') AS synonyms"));
        assert!(sql.contains("GROUP BY c.concept_id"));
        assert!(!sql.contains("{schema}"));
    }

    #[test]
    fn test_schema_must_be_identifier() {
        for bad in ["", "cdm v5", "cdm;drop", "1cdm", "cdm.x"] {
            assert!(
                matches!(
                    ExtractTable::Domains.query(bad),
                    Err(ExtractError::InvalidSchema(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_file_names_are_unique() {
        let mut names: Vec<&str> = ExtractTable::ALL.iter().map(|t| t.file_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 5);
    }

    #[test]
    fn test_finished_file_is_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("export").join("domain.csv");

        let mut writer = ExtractFileWriter::create(&path).unwrap();
        writer.write_chunk(b"\"domain_id\"\n").unwrap();
        writer.write_chunk(b"\"Drug\"\n").unwrap();
        assert_eq!(writer.finish().unwrap(), 19);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "\"domain_id\"\n\"Drug\"\n"
        );
    }

    #[test]
    fn test_unfinished_file_is_removed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("concept_ancestor.csv");

        {
            let mut writer = ExtractFileWriter::create(&path).unwrap();
            writer.write_chunk(b"partial").unwrap();
            assert!(path.exists());
        }

        assert!(!path.exists());
    }
}
