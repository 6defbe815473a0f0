//! Buffered batch writer over a [`BatchSink`].

use tracing::debug;

use crate::error::{CoreError, SinkError};
use crate::sink::BatchSink;

/// Totals for one batched write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub batches: u64,
    pub rows: u64,
}

/// Collects rows and appends them to a sink in fixed-size batches.
///
/// The sink is truncated when the batcher starts; the final partial batch
/// is written by [`finish`](Self::finish).
pub struct MappingBatcher<T, S: BatchSink<T>> {
    sink: S,
    batch_size: usize,
    buffer: Vec<T>,
    stats: BatchStats,
}

impl<T, S: BatchSink<T>> MappingBatcher<T, S> {
    pub fn start(mut sink: S, batch_size: usize) -> Result<Self, CoreError> {
        if batch_size == 0 {
            return Err(CoreError::InvalidBatchSize);
        }
        sink.truncate()?;
        Ok(Self {
            sink,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            stats: BatchStats::default(),
        })
    }

    pub fn push(&mut self, row: T) -> Result<(), SinkError> {
        self.buffer.push(row);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    /// Write the remaining rows and hand back the sink.
    pub fn finish(mut self) -> Result<(S, BatchStats), SinkError> {
        self.flush()?;
        Ok((self.sink, self.stats))
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.sink.append_batch(&self.buffer)?;
        self.stats.batches += 1;
        self.stats.rows += self.buffer.len() as u64;
        debug!(batch = self.stats.batches, rows = self.buffer.len(), "Flushed batch");
        self.buffer.clear();
        Ok(())
    }
}
