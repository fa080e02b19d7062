//! Bounded offline buffer.
//!
//! Holds samples that could not be uploaded and hands them back in insertion
//! order, a chunk at a time, for batch upload.
//!
//! # Invariants
//!
//! - `len() <= capacity()` at all times
//! - Overflow evicts the oldest sample, never the newest
//! - A chunk whose upload failed goes back to the head in its original
//!   order, so the next attempt sees exactly the same sequence
//!
//! The buffer does no I/O and cannot fail; upload outcomes are reported to it
//! through [`BoundedOfflineBuffer::handle_multi_upload_result`].

use std::collections::VecDeque;

use crate::location::LocationSample;

/// Outcome of one batch upload, as seen by the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiUploadProgress {
    /// More samples are waiting and the last batch succeeded.
    pub can_continue: bool,
    /// The last batch failed.
    pub is_error: bool,
}

/// Where a new sample goes when it is offered for upload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// The buffer is empty; upload the sample on its own.
    Direct,
    /// The sample was queued behind the backlog. `evicted` is the oldest
    /// sample dropped to make room, if the buffer was full.
    Queued { evicted: Option<LocationSample> },
}

/// Fixed-capacity FIFO of samples awaiting upload.
#[derive(Debug, Clone)]
pub struct BoundedOfflineBuffer {
    samples: VecDeque<LocationSample>,
    capacity: usize,
}

impl BoundedOfflineBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Maximum number of samples held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples waiting.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Waiting samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LocationSample> {
        self.samples.iter()
    }

    /// Whether `sample` may be uploaded on its own.
    ///
    /// Returns [`Admission::Direct`] when the buffer is empty. Otherwise the
    /// sample is queued behind the backlog (with the usual drop-oldest rule)
    /// and [`Admission::Queued`] reports any eviction: the backlog has to
    /// drain first so samples reach the store in order.
    pub fn can_upload_directly(&mut self, sample: &LocationSample) -> Admission {
        if self.samples.is_empty() {
            return Admission::Direct;
        }
        Admission::Queued {
            evicted: self.store_failed_upload(*sample),
        }
    }

    /// Queue a sample whose upload failed.
    ///
    /// At capacity, the oldest sample is evicted first and returned.
    pub fn store_failed_upload(&mut self, sample: LocationSample) -> Option<LocationSample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    /// Remove and return up to `max_chunk_size` samples from the head.
    pub fn next_upload_chunk(&mut self, max_chunk_size: usize) -> Vec<LocationSample> {
        let take = max_chunk_size.min(self.samples.len());
        self.samples.drain(..take).collect()
    }

    /// Record the outcome of uploading `chunk`.
    ///
    /// On success the chunk is gone for good (it was removed by
    /// [`next_upload_chunk`](Self::next_upload_chunk)) and draining may
    /// continue while samples remain. On failure the chunk is put back at the
    /// head in its original order and draining stops. If samples were added
    /// in between and the chunk no longer fits, its oldest entries are
    /// dropped.
    pub fn handle_multi_upload_result(
        &mut self,
        chunk: Vec<LocationSample>,
        success: bool,
    ) -> MultiUploadProgress {
        if success {
            return MultiUploadProgress {
                can_continue: !self.samples.is_empty(),
                is_error: false,
            };
        }

        let room = self.capacity.saturating_sub(self.samples.len());
        let skip = chunk.len().saturating_sub(room);
        if skip > 0 {
            tracing::warn!(
                dropped = skip,
                capacity = self.capacity,
                "Offline buffer full while re-queuing failed chunk, dropping oldest samples"
            );
        }
        for sample in chunk.into_iter().skip(skip).rev() {
            self.samples.push_front(sample);
        }

        MultiUploadProgress {
            can_continue: false,
            is_error: true,
        }
    }

}
