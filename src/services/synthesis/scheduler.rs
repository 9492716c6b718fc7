//! Batch Scheduler
//!
//! Splits a job of N responses into fixed-size batches and drives them with
//! a bounded pool of worker loops. Workers claim batch indices from a shared
//! atomic counter, fan out every item of the claimed batch concurrently, run
//! the diversity pass, then report the batch before claiming the next one.
//! Results are written into index-stable slots, so output order never depends
//! on completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use survey_synth_core::{BatchTiming, GeneratedResponse};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::config::{DiversityStrategy, BATCH_SIZE};
use super::diversity::enforce_diversity;
use super::generator::{ResponseGenerator, SurveyInput};

/// Error type returned by batch observers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Types
// ============================================================================

/// A finished batch as reported to an observer.
#[derive(Debug, Clone, Copy)]
pub struct BatchCompletion<'a> {
    /// Batch index (0-based)
    pub batch_index: usize,
    /// The batch's responses after the diversity pass
    pub responses: &'a [GeneratedResponse],
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Number of responses in this batch
    pub item_count: usize,
    /// Number of batches in the job
    pub total_batches: usize,
}

/// Receives each batch as soon as it completes.
///
/// Errors are logged and otherwise ignored; they never affect scheduling.
#[async_trait]
pub trait BatchObserver: Send + Sync {
    async fn on_batch_complete(&self, batch: &BatchCompletion<'_>) -> Result<(), BoxError>;
}

/// Result of a generation job.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    /// Responses ordered by ordinal: `responses[i]` is ordinal `i + 1`
    pub responses: Vec<GeneratedResponse>,
    /// Per-batch timings ordered by batch index
    pub batch_timings: Vec<BatchTiming>,
    /// How many responses came from the fallback generator
    pub fallback_count: usize,
}

/// Number of batches needed for `count` responses.
pub fn batch_count(count: usize) -> usize {
    count.div_ceil(BATCH_SIZE)
}

/// Ordinal range `[start, end)` (0-based slot indices) covered by a batch.
pub fn batch_bounds(batch_index: usize, count: usize) -> (usize, usize) {
    let start = batch_index * BATCH_SIZE;
    (start, (start + BATCH_SIZE).min(count))
}

/// Shared state of one running job.
struct JobState {
    count: usize,
    total_batches: usize,
    next_batch: AtomicUsize,
    slots: Mutex<Vec<Option<GeneratedResponse>>>,
    timings: Mutex<Vec<Option<BatchTiming>>>,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Bounded-concurrency batch driver.
pub struct BatchScheduler<'g> {
    generator: &'g ResponseGenerator,
    max_concurrent_batches: usize,
    diversity: DiversityStrategy,
}

impl<'g> BatchScheduler<'g> {
    pub fn new(generator: &'g ResponseGenerator) -> Self {
        let config = generator.config();
        Self {
            generator,
            max_concurrent_batches: config.max_concurrent_batches.max(1),
            diversity: config.diversity,
        }
    }

    /// Generate `count` responses. Never fails; every slot is filled.
    pub async fn run(
        &self,
        survey: &SurveyInput<'_>,
        count: usize,
        observer: Option<&dyn BatchObserver>,
    ) -> GenerationOutput {
        if count == 0 {
            return GenerationOutput::default();
        }

        let total_batches = batch_count(count);
        let state = JobState {
            count,
            total_batches,
            next_batch: AtomicUsize::new(0),
            slots: Mutex::new((0..count).map(|_| None).collect()),
            timings: Mutex::new((0..total_batches).map(|_| None).collect()),
        };

        let worker_count = self.max_concurrent_batches.min(total_batches);
        debug!(
            count,
            total_batches, worker_count, "scheduler: starting workers"
        );
        let shared = &state;
        let workers = (0..worker_count)
            .map(move |worker_id| self.worker(worker_id, shared, survey, observer));
        join_all(workers).await;

        let responses: Vec<GeneratedResponse> =
            state.slots.into_inner().into_iter().flatten().collect();
        let batch_timings: Vec<BatchTiming> =
            state.timings.into_inner().into_iter().flatten().collect();
        let fallback_count = responses.iter().filter(|r| r.is_fallback()).count();

        GenerationOutput {
            responses,
            batch_timings,
            fallback_count,
        }
    }

    /// Claim and run batches until the counter passes the last batch.
    async fn worker(
        &self,
        worker_id: usize,
        state: &JobState,
        survey: &SurveyInput<'_>,
        observer: Option<&dyn BatchObserver>,
    ) {
        loop {
            let batch_index = state.next_batch.fetch_add(1, Ordering::SeqCst);
            if batch_index >= state.total_batches {
                break;
            }
            self.run_batch(worker_id, batch_index, state, survey, observer)
                .await;
        }
        debug!(worker_id, "scheduler: worker finished");
    }

    async fn run_batch(
        &self,
        worker_id: usize,
        batch_index: usize,
        state: &JobState,
        survey: &SurveyInput<'_>,
        observer: Option<&dyn BatchObserver>,
    ) {
        let (start, end) = batch_bounds(batch_index, state.count);
        let started_at = Utc::now();
        let clock = Instant::now();

        let generator = self.generator;
        let items = (start..end).map(move |slot| generator.generate(survey, slot + 1));
        let mut batch: Vec<GeneratedResponse> = join_all(items).await;

        if self.diversity == DiversityStrategy::ForwardPass {
            enforce_diversity(survey.questions, &mut batch);
        }

        let completed_at = Utc::now();
        let duration_ms = clock.elapsed().as_millis() as u64;
        let item_count = batch.len();
        debug!(
            worker_id,
            batch_index, item_count, duration_ms, "scheduler: batch complete"
        );

        state.timings.lock().await[batch_index] = Some(BatchTiming {
            batch_index,
            started_at,
            completed_at,
            duration_ms,
            item_count,
        });

        if let Some(observer) = observer {
            let completion = BatchCompletion {
                batch_index,
                responses: &batch,
                started_at,
                completed_at,
                item_count,
                total_batches: state.total_batches,
            };
            if let Err(e) = observer.on_batch_complete(&completion).await {
                warn!(batch_index, error = %e, "scheduler: batch observer failed");
            }
        }

        let mut slots = state.slots.lock().await;
        for (offset, response) in batch.into_iter().enumerate() {
            slots[start + offset] = Some(response);
        }
    }
}
