//! Storage seams: batch sinks for output tables and a range-readable
//! source of direct mappings.

use labhpo_model::DirectMapping;

use crate::error::SinkError;

/// Append-only destination for one output table.
///
/// Each `append_batch` call is one unit of work: it either stores the whole
/// batch or fails. A failure must abort the run.
pub trait BatchSink<T> {
    /// Discard everything previously written.
    fn truncate(&mut self) -> Result<(), SinkError>;

    fn append_batch(&mut self, batch: &[T]) -> Result<(), SinkError>;
}

impl<T, S: BatchSink<T> + ?Sized> BatchSink<T> for &mut S {
    fn truncate(&mut self) -> Result<(), SinkError> {
        (**self).truncate()
    }

    fn append_batch(&mut self, batch: &[T]) -> Result<(), SinkError> {
        (**self).append_batch(batch)
    }
}

/// Read access to a direct-mapping table by row-id range.
pub trait MappingSource {
    /// Smallest and largest row id present, `None` when empty.
    fn row_id_range(&self) -> Result<Option<(u64, u64)>, SinkError>;

    /// All rows with `lo <= row_id <= hi`.
    fn load_range(&self, lo: u64, hi: u64) -> Result<Vec<DirectMapping>, SinkError>;
}

/// In-memory sink that keeps every appended row.
#[derive(Debug, Clone)]
pub struct MemorySink<T> {
    rows: Vec<T>,
    batches: usize,
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            batches: 0,
        }
    }
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Number of batches appended since the last truncate.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl<T: Clone> BatchSink<T> for MemorySink<T> {
    fn truncate(&mut self) -> Result<(), SinkError> {
        self.rows.clear();
        self.batches = 0;
        Ok(())
    }

    fn append_batch(&mut self, batch: &[T]) -> Result<(), SinkError> {
        self.rows.extend_from_slice(batch);
        self.batches += 1;
        Ok(())
    }
}

/// In-memory direct-mapping table, kept sorted by row id.
///
/// A row id may carry several mappings (e.g. terms mined from one note).
#[derive(Debug, Clone, Default)]
pub struct MemoryMappingStore {
    rows: Vec<DirectMapping>,
}

impl MemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[DirectMapping] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<DirectMapping> for MemoryMappingStore {
    fn from_iter<I: IntoIterator<Item = DirectMapping>>(iter: I) -> Self {
        let mut rows: Vec<DirectMapping> = iter.into_iter().collect();
        rows.sort_by_key(|row| row.row_id);
        Self { rows }
    }
}

impl BatchSink<DirectMapping> for MemoryMappingStore {
    fn truncate(&mut self) -> Result<(), SinkError> {
        self.rows.clear();
        Ok(())
    }

    fn append_batch(&mut self, batch: &[DirectMapping]) -> Result<(), SinkError> {
        self.rows.extend_from_slice(batch);
        self.rows.sort_by_key(|row| row.row_id);
        Ok(())
    }
}

impl MappingSource for MemoryMappingStore {
    fn row_id_range(&self) -> Result<Option<(u64, u64)>, SinkError> {
        Ok(self
            .rows
            .first()
            .zip(self.rows.last())
            .map(|(first, last)| (first.row_id, last.row_id)))
    }

    fn load_range(&self, lo: u64, hi: u64) -> Result<Vec<DirectMapping>, SinkError> {
        let start = self.rows.partition_point(|row| row.row_id < lo);
        let end = self.rows.partition_point(|row| row.row_id <= hi);
        Ok(self.rows.get(start..end).unwrap_or_default().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labhpo_model::NegationFlag;

    fn mapping(row_id: u64) -> DirectMapping {
        DirectMapping {
            row_id,
            negated: NegationFlag::Present,
            map_to: "HP:0000001".to_string(),
        }
    }

    #[test]
    fn store_loads_inclusive_ranges() {
        let store: MemoryMappingStore = [5, 1, 3, 3, 9].into_iter().map(mapping).collect();
        assert_eq!(store.row_id_range().unwrap(), Some((1, 9)));
        let ids: Vec<u64> = store.load_range(3, 5).unwrap().iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![3, 3, 5]);
        assert!(store.load_range(6, 8).unwrap().is_empty());
        assert!(store.load_range(10, 2).unwrap().is_empty());
    }

    #[test]
    fn empty_store_has_no_range() {
        assert_eq!(MemoryMappingStore::new().row_id_range().unwrap(), None);
    }

    #[test]
    fn memory_sink_truncate_discards_rows() {
        let mut sink = MemorySink::new();
        sink.append_batch(&[1, 2]).unwrap();
        sink.append_batch(&[3]).unwrap();
        assert_eq!(sink.rows(), &[1, 2, 3]);
        assert_eq!(sink.batches(), 2);
        sink.truncate().unwrap();
        assert!(sink.rows().is_empty());
        assert_eq!(sink.batches(), 0);
    }
}
