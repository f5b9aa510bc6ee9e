//! Forward-only chunked iteration over delimited extract files.
//!
//! A `ChunkedReader` yields bounded batches of records in input order and
//! cannot be rewound; restarting means opening the file again.

use crate::error::TransformError;
use csv::{Reader, ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Header lookup for an extract file.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    path: PathBuf,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn new(path: impl Into<PathBuf>, headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self {
            path: path.into(),
            positions,
        }
    }

    /// Position of a column that must be present.
    pub fn require(&self, column: &str) -> Result<usize, TransformError> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| TransformError::missing_column(&self.path, column))
    }

    /// Position of a column that may be absent.
    pub fn optional(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }
}

/// A bounded batch of consecutive records.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Zero-based chunk number
    pub index: usize,
    /// One-based data row number of the first record
    pub first_row: u64,
    pub rows: Vec<StringRecord>,
}

impl Chunk {
    /// Rows paired with their one-based data row numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (u64, &StringRecord)> {
        self.rows
            .iter()
            .enumerate()
            .map(move |(i, row)| (self.first_row + i as u64, row))
    }
}

/// Iterator of [`Chunk`]s over a header-bearing CSV source.
pub struct ChunkedReader<R: Read> {
    path: PathBuf,
    reader: Reader<R>,
    columns: ColumnIndex,
    chunk_size: usize,
    next_index: usize,
    rows_read: u64,
    exhausted: bool,
}

impl ChunkedReader<File> {
    /// Open an extract file and read its header row.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self, TransformError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| TransformError::open(path, e))?;
        Self::from_reader(path, reader, chunk_size)
    }
}

impl<R: Read> ChunkedReader<R> {
    fn from_reader(
        path: &Path,
        mut reader: Reader<R>,
        chunk_size: usize,
    ) -> Result<Self, TransformError> {
        let headers = reader
            .headers()
            .map_err(|e| TransformError::open(path, e))?
            .clone();
        Ok(Self {
            path: path.to_path_buf(),
            columns: ColumnIndex::new(path, &headers),
            reader,
            chunk_size: chunk_size.max(1),
            next_index: 0,
            rows_read: 0,
            exhausted: false,
        })
    }

    /// Wrap an arbitrary source; `label` is used in error messages.
    pub fn with_source(label: &Path, source: R, chunk_size: usize) -> Result<Self, TransformError> {
        let reader = ReaderBuilder::new().has_headers(true).from_reader(source);
        Self::from_reader(label, reader, chunk_size)
    }

    pub fn columns(&self) -> &ColumnIndex {
        &self.columns
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>, TransformError> {
        let mut rows = Vec::with_capacity(self.chunk_size.min(8192));
        let mut record = StringRecord::new();
        while rows.len() < self.chunk_size {
            let more = self
                .reader
                .read_record(&mut record)
                .map_err(|e| TransformError::csv(&self.path, e))?;
            if !more {
                self.exhausted = true;
                break;
            }
            rows.push(record.clone());
        }

        if rows.is_empty() {
            return Ok(None);
        }

        let chunk = Chunk {
            index: self.next_index,
            first_row: self.rows_read + 1,
            rows,
        };
        self.next_index += 1;
        self.rows_read += chunk.rows.len() as u64;
        Ok(Some(chunk))
    }
}

impl<R: Read> Iterator for ChunkedReader<R> {
    type Item = Result<Chunk, TransformError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.read_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &'static str, chunk_size: usize) -> ChunkedReader<&'static [u8]> {
        ChunkedReader::with_source(Path::new("test.csv"), data.as_bytes(), chunk_size).unwrap()
    }

    #[test]
    fn test_chunks_preserve_order_and_bounds() {
        let chunks: Vec<Chunk> = reader("id\n1\n2\n3\n4\n5\n", 2)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].rows.len(), 2);
        assert_eq!(chunks[2].rows.len(), 1);
        assert_eq!(chunks[2].index, 2);
        assert_eq!(chunks[2].first_row, 5);

        let ids: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.rows.iter().map(|r| r[0].to_string()))
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let chunks: Vec<Chunk> = reader("id\n1\n2\n3\n4\n", 2)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_header_only_yields_nothing() {
        assert_eq!(reader("id,name\n", 10).count(), 0);
    }

    #[test]
    fn test_quoted_fields_with_delimiters() {
        let mut r = reader("id,name\n\"1\",\"a, b\"\n\"2\",\"line\nbreak\"\n", 10);
        let chunk = r.next().unwrap().unwrap();
        assert_eq!(&chunk.rows[0][1], "a, b");
        assert_eq!(&chunk.rows[1][1], "line\nbreak");
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        let mut r = reader("id,name\n1,a\n2\n", 10);
        let err = r.next().unwrap().unwrap_err();
        assert!(matches!(err, TransformError::Csv { .. }));
        assert!(r.next().is_none());
    }

    #[test]
    fn test_column_index() {
        let r = reader("concept_id, concept_name\n", 10);
        assert_eq!(r.columns().require("concept_name").unwrap(), 1);
        assert_eq!(r.columns().optional("synonyms"), None);
        assert!(matches!(
            r.columns().require("synonyms"),
            Err(TransformError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_numbered_rows() {
        let mut r = reader("id\n1\n2\n3\n", 2);
        r.next();
        let chunk = r.next().unwrap().unwrap();
        let numbers: Vec<u64> = chunk.numbered().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![3]);
    }
}
