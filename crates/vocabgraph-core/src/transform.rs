//! Relational extract → graph record file transformation.
//!
//! Reference tables (domains, vocabularies) are read in one pass. Concepts,
//! semantic relationships and ancestor pairs are streamed chunk by chunk so
//! memory stays bounded by the chunk size. Row order is preserved end to end.
//!
//! Every output file is recreated when its table is transformed; a failed run
//! leaves earlier tables' files in place and must be treated as unusable.

use crate::chunks::{ChunkedReader, ColumnIndex};
use crate::error::TransformError;
use crate::model::{
    concept_labels, parse_synonyms, ARRAY_DELIMITER, DOMAIN_LABEL, FROM_VOCABULARY, HAS_ANCESTOR,
    IN_DOMAIN, VOCABULARY_LABEL,
};
use crate::records::{
    parse_record_date, RecordFile, ANCESTOR_EXTRACT, CONCEPT_EXTRACT, DOMAIN_EXTRACT,
    RELATIONSHIP_EXTRACT, VOCABULARY_EXTRACT,
};
use crate::sanitize::{standardize_label, standardize_reltype};
use csv::{StringRecord, Writer, WriterBuilder};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default rows per chunk for the large tables.
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

// ============================================================================
// Configuration
// ============================================================================

/// Where column headers are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// First row of each data file (online load)
    #[default]
    Inline,
    /// Separate `<stem>_header.csv` beside a header-free data file (bulk import)
    Separate,
}

/// Configuration for the transformer.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Directory holding the extract files
    pub input_dir: PathBuf,
    /// Directory receiving the record files
    pub output_dir: PathBuf,
    /// Rows per chunk for the large tables
    pub chunk_size: usize,
    pub header_mode: HeaderMode,
}

impl TransformConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            header_mode: HeaderMode::Inline,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_header_mode(mut self, header_mode: HeaderMode) -> Self {
        self.header_mode = header_mode;
        self
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// One record file written by the transformer.
#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub file: RecordFile,
    pub path: PathBuf,
    /// Header file, when headers are written separately
    pub header_path: Option<PathBuf>,
    /// Data rows written (header excluded)
    pub rows: u64,
}

/// Result of a full transformation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformSummary {
    pub outputs: Vec<OutputSummary>,
    pub elapsed_ms: u128,
}

impl TransformSummary {
    pub fn output(&self, file: RecordFile) -> Option<&OutputSummary> {
        self.outputs.iter().find(|o| o.file == file)
    }

    /// Rows written to `file`, zero if it was not produced.
    pub fn rows(&self, file: RecordFile) -> u64 {
        self.output(file).map(|o| o.rows).unwrap_or(0)
    }
}

// ============================================================================
// Record writer
// ============================================================================

/// Streaming writer for one record file.
///
/// Creating it truncates the data file, so every run starts from empty output.
struct RecordWriter {
    file: RecordFile,
    path: PathBuf,
    header_path: Option<PathBuf>,
    writer: Writer<File>,
    rows: u64,
}

impl RecordWriter {
    fn create(dir: &Path, file: RecordFile, mode: HeaderMode) -> Result<Self, TransformError> {
        std::fs::create_dir_all(dir).map_err(|e| TransformError::create(dir, e))?;

        let path = dir.join(file.file_name());
        let handle = File::create(&path).map_err(|e| TransformError::create(&path, e))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(handle);

        let header_path = match mode {
            HeaderMode::Inline => {
                writer
                    .write_record(file.header())
                    .map_err(|e| TransformError::csv(&path, e))?;
                None
            }
            HeaderMode::Separate => {
                let header_path = dir.join(file.header_file_name());
                let mut header = WriterBuilder::new()
                    .has_headers(false)
                    .from_path(&header_path)
                    .map_err(|e| TransformError::csv(&header_path, e))?;
                header
                    .write_record(file.header())
                    .map_err(|e| TransformError::csv(&header_path, e))?;
                header
                    .flush()
                    .map_err(|e| TransformError::create(&header_path, e))?;
                Some(header_path)
            }
        };

        debug!("Created record file {:?}", path);
        Ok(Self {
            file,
            path,
            header_path,
            writer,
            rows: 0,
        })
    }

    fn write<I, T>(&mut self, record: I) -> Result<(), TransformError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(record)
            .map_err(|e| TransformError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(mut self) -> Result<OutputSummary, TransformError> {
        self.writer.flush()?;
        info!("Wrote {} rows to {:?}", self.rows, self.path);
        Ok(OutputSummary {
            file: self.file,
            path: self.path,
            header_path: self.header_path,
            rows: self.rows,
        })
    }
}

// ============================================================================
// Field access and validation
// ============================================================================

/// A resolved input column.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    index: usize,
}

impl Field {
    fn require(columns: &ColumnIndex, name: &'static str) -> Result<Self, TransformError> {
        Ok(Self {
            name,
            index: columns.require(name)?,
        })
    }
}

/// One input row plus what is needed to report a bad value.
struct Row<'a> {
    path: &'a Path,
    number: u64,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn text(&self, field: Field) -> &'a str {
        self.record.get(field.index).unwrap_or("")
    }

    fn invalid(&self, field: Field, value: &str, reason: &str) -> TransformError {
        TransformError::invalid_value(self.path, self.number, field.name, value, reason)
    }

    /// Integer identifier or count. Returned trimmed.
    fn integer(&self, field: Field) -> Result<&'a str, TransformError> {
        let value = self.text(field).trim();
        value
            .parse::<i64>()
            .map(|_| value)
            .map_err(|_| self.invalid(field, value, "expected an integer"))
    }

    /// `YYYY-MM-DD` date; an empty field is passed through as absent.
    fn date(&self, field: Field) -> Result<&'a str, TransformError> {
        let value = self.text(field).trim();
        if value.is_empty() {
            return Ok(value);
        }
        parse_record_date(value)
            .map(|_| value)
            .ok_or_else(|| self.invalid(field, value, "expected a YYYY-MM-DD date"))
    }
}

struct ConceptColumns {
    id: Field,
    name: Field,
    domain: Field,
    vocabulary: Field,
    class: Field,
    standard: Field,
    code: Field,
    valid_start: Field,
    valid_end: Field,
    invalid_reason: Field,
    synonyms: Option<usize>,
}

impl ConceptColumns {
    fn resolve(columns: &ColumnIndex) -> Result<Self, TransformError> {
        Ok(Self {
            id: Field::require(columns, "concept_id")?,
            name: Field::require(columns, "concept_name")?,
            domain: Field::require(columns, "domain_id")?,
            vocabulary: Field::require(columns, "vocabulary_id")?,
            class: Field::require(columns, "concept_class_id")?,
            standard: Field::require(columns, "standard_concept")?,
            code: Field::require(columns, "concept_code")?,
            valid_start: Field::require(columns, "valid_start_date")?,
            valid_end: Field::require(columns, "valid_end_date")?,
            invalid_reason: Field::require(columns, "invalid_reason")?,
            synonyms: columns.optional("synonyms"),
        })
    }
}

// ============================================================================
// Transformer
// ============================================================================

/// Converts extract files into graph record files.
pub struct Transformer {
    config: TransformConfig,
}

impl Transformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    fn input(&self, name: &str) -> PathBuf {
        self.config.input_dir.join(name)
    }

    fn writer(&self, file: RecordFile) -> Result<RecordWriter, TransformError> {
        RecordWriter::create(&self.config.output_dir, file, self.config.header_mode)
    }

    /// Transform every table, reference tables first.
    pub fn run(&self) -> Result<TransformSummary, TransformError> {
        let start = Instant::now();
        info!(
            "Transforming extracts from {:?} into {:?}",
            self.config.input_dir, self.config.output_dir
        );

        let mut outputs = vec![self.transform_domains()?, self.transform_vocabularies()?];
        outputs.extend(self.transform_concepts()?);
        outputs.push(self.transform_semantic_relationships()?);
        outputs.push(self.transform_ancestors()?);

        let summary = TransformSummary {
            outputs,
            elapsed_ms: start.elapsed().as_millis(),
        };
        info!("Transformation complete in {} ms", summary.elapsed_ms);
        Ok(summary)
    }

    /// Domain reference table, read in one pass.
    pub fn transform_domains(&self) -> Result<OutputSummary, TransformError> {
        let path = self.input(DOMAIN_EXTRACT);
        info!("Processing domains from {:?}", path);

        let reader = ChunkedReader::open(&path, usize::MAX)?;
        let id = Field::require(reader.columns(), "domain_id")?;
        let name = Field::require(reader.columns(), "domain_name")?;
        let concept = Field::require(reader.columns(), "domain_concept_id")?;

        let mut out = self.writer(RecordFile::DomainNodes)?;
        for chunk in reader {
            let chunk = chunk?;
            for (number, record) in chunk.numbered() {
                let row = Row {
                    path: &path,
                    number,
                    record,
                };
                out.write([
                    row.text(id),
                    DOMAIN_LABEL,
                    row.text(name),
                    row.integer(concept)?,
                ])?;
            }
        }
        out.finish()
    }

    /// Vocabulary reference table, read in one pass.
    pub fn transform_vocabularies(&self) -> Result<OutputSummary, TransformError> {
        let path = self.input(VOCABULARY_EXTRACT);
        info!("Processing vocabularies from {:?}", path);

        let reader = ChunkedReader::open(&path, usize::MAX)?;
        let id = Field::require(reader.columns(), "vocabulary_id")?;
        let name = Field::require(reader.columns(), "vocabulary_name")?;
        let reference = Field::require(reader.columns(), "vocabulary_reference")?;
        let version = Field::require(reader.columns(), "vocabulary_version")?;
        let concept = Field::require(reader.columns(), "vocabulary_concept_id")?;

        let mut out = self.writer(RecordFile::VocabularyNodes)?;
        for chunk in reader {
            let chunk = chunk?;
            for (number, record) in chunk.numbered() {
                let row = Row {
                    path: &path,
                    number,
                    record,
                };
                out.write([
                    row.text(id),
                    VOCABULARY_LABEL,
                    row.text(name),
                    row.text(reference),
                    row.text(version),
                    row.integer(concept)?,
                ])?;
            }
        }
        out.finish()
    }

    /// Concept nodes plus exactly one domain edge and one vocabulary edge per row.
    ///
    /// Returns summaries for the node file and both contextual edge files.
    pub fn transform_concepts(&self) -> Result<Vec<OutputSummary>, TransformError> {
        let path = self.input(CONCEPT_EXTRACT);
        info!(
            "Processing concepts from {:?} in chunks of {}",
            path, self.config.chunk_size
        );

        let reader = ChunkedReader::open(&path, self.config.chunk_size)?;
        let cols = ConceptColumns::resolve(reader.columns())?;
        if cols.synonyms.is_none() {
            warn!("{:?} has no synonyms column; synonym lists will be empty", path);
        }

        let mut nodes = self.writer(RecordFile::ConceptNodes)?;
        let mut in_domain = self.writer(RecordFile::InDomain)?;
        let mut from_vocabulary = self.writer(RecordFile::FromVocabulary)?;
        // Labels depend only on (domain, standard flag)
        let mut label_fields: HashMap<(String, String), String> = HashMap::new();
        let delimiter = ARRAY_DELIMITER.to_string();

        for chunk in reader {
            let chunk = chunk?;
            for (number, record) in chunk.numbered() {
                let row = Row {
                    path: &path,
                    number,
                    record,
                };
                let concept_id = row.integer(cols.id)?;
                let domain_id = row.text(cols.domain);
                let vocabulary_id = row.text(cols.vocabulary);
                let standard = row.text(cols.standard);

                let label_field = label_fields
                    .entry((domain_id.to_string(), standard.to_string()))
                    .or_insert_with(|| {
                        if standardize_label(domain_id).is_empty() {
                            warn!(
                                "Domain '{}' yields no label; concepts keep only their base labels",
                                domain_id
                            );
                        }
                        concept_labels(domain_id, standard).to_field()
                    });

                let synonyms = cols
                    .synonyms
                    .map(|i| parse_synonyms(record.get(i).unwrap_or("")))
                    .unwrap_or_default();

                let synonym_field = synonyms.join(&delimiter);
                nodes.write([
                    concept_id,
                    concept_id,
                    label_field.as_str(),
                    row.text(cols.name),
                    domain_id,
                    vocabulary_id,
                    row.text(cols.class),
                    standard,
                    row.text(cols.code),
                    row.date(cols.valid_start)?,
                    row.date(cols.valid_end)?,
                    row.text(cols.invalid_reason),
                    synonym_field.as_str(),
                ])?;
                in_domain.write([concept_id, domain_id, IN_DOMAIN])?;
                from_vocabulary.write([concept_id, vocabulary_id, FROM_VOCABULARY])?;
            }
            debug!(
                "Processed concept chunk {} ({} rows)",
                chunk.index,
                chunk.rows.len()
            );
        }

        Ok(vec![
            nodes.finish()?,
            in_domain.finish()?,
            from_vocabulary.finish()?,
        ])
    }

    /// Semantic relationships, typed by the sanitized relationship name.
    pub fn transform_semantic_relationships(&self) -> Result<OutputSummary, TransformError> {
        let path = self.input(RELATIONSHIP_EXTRACT);
        info!(
            "Processing concept relationships from {:?} in chunks of {}",
            path, self.config.chunk_size
        );

        let reader = ChunkedReader::open(&path, self.config.chunk_size)?;
        let columns = reader.columns();
        let start_id = Field::require(columns, "concept_id_1")?;
        let end_id = Field::require(columns, "concept_id_2")?;
        let relationship = Field::require(columns, "relationship_id")?;
        let valid_start = Field::require(columns, "valid_start_date")?;
        let valid_end = Field::require(columns, "valid_end_date")?;
        let invalid_reason = Field::require(columns, "invalid_reason")?;

        let mut out = self.writer(RecordFile::Semantic)?;
        for chunk in reader {
            let chunk = chunk?;
            for (number, record) in chunk.numbered() {
                let row = Row {
                    path: &path,
                    number,
                    record,
                };
                let raw = row.text(relationship);
                let rel_type = standardize_reltype(raw);
                if rel_type.is_empty() {
                    return Err(row.invalid(
                        relationship,
                        raw,
                        "sanitizes to an empty relationship type",
                    ));
                }
                out.write([
                    row.integer(start_id)?,
                    row.integer(end_id)?,
                    rel_type.as_str(),
                    raw,
                    row.date(valid_start)?,
                    row.date(valid_end)?,
                    row.text(invalid_reason),
                ])?;
            }
            debug!(
                "Processed relationship chunk {} ({} rows)",
                chunk.index,
                chunk.rows.len()
            );
        }
        out.finish()
    }

    /// Ancestor closure pairs as descendant → ancestor edges.
    pub fn transform_ancestors(&self) -> Result<OutputSummary, TransformError> {
        let path = self.input(ANCESTOR_EXTRACT);
        info!(
            "Processing concept ancestors from {:?} in chunks of {}",
            path, self.config.chunk_size
        );

        let reader = ChunkedReader::open(&path, self.config.chunk_size)?;
        let columns = reader.columns();
        let descendant = Field::require(columns, "descendant_concept_id")?;
        let ancestor = Field::require(columns, "ancestor_concept_id")?;
        let min_levels = Field::require(columns, "min_levels_of_separation")?;
        let max_levels = Field::require(columns, "max_levels_of_separation")?;

        let mut out = self.writer(RecordFile::Ancestor)?;
        for chunk in reader {
            let chunk = chunk?;
            for (number, record) in chunk.numbered() {
                let row = Row {
                    path: &path,
                    number,
                    record,
                };
                out.write([
                    row.integer(descendant)?,
                    row.integer(ancestor)?,
                    HAS_ANCESTOR,
                    row.integer(min_levels)?,
                    row.integer(max_levels)?,
                ])?;
            }
            debug!(
                "Processed ancestor chunk {} ({} rows)",
                chunk.index,
                chunk.rows.len()
            );
        }
        out.finish()
    }
}
