//! Per-topic prefetch buffer of generated questions.
//!
//! Each topic owns a FIFO queue and a refill lock. Consumers pop from the
//! front without touching the refill lock; refills append to the back and are
//! serialized per topic so at most one generation call is in flight for any
//! topic at a time. Different topics refill fully independently.
//!
//! Queue length is read optimistically outside the refill lock when deciding
//! whether to trigger a refill. Under a multi-threaded runtime the value may
//! be stale by the time it is acted on; the worst outcomes are one extra
//! refill or an `EmptyBuffer` error for a consumer that lost the race for the
//! last item. The queue itself is always mutated under its own mutex.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::services::generator::QuestionGenerator;

pub const DEFAULT_BUFFER_CAPACITY: usize = 20;
pub const DEFAULT_LOW_WATER_MARK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSettings {
    /// A refill is skipped when the queue already holds at least this many.
    pub capacity: usize,
    /// A background refill is triggered when the queue is at or below this.
    pub low_water_mark: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_BUFFER_CAPACITY,
            low_water_mark: DEFAULT_LOW_WATER_MARK,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicSnapshot {
    pub subject: String,
    pub queued: usize,
    pub refill_pending: bool,
}

struct TopicState {
    queue: Mutex<VecDeque<Question>>,
    refill_lock: tokio::sync::Mutex<()>,
    refill_pending: AtomicBool,
}

impl TopicState {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            refill_lock: tokio::sync::Mutex::new(()),
            refill_pending: AtomicBool::new(false),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Question>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn len(&self) -> usize {
        self.queue().len()
    }

    fn is_refill_pending(&self) -> bool {
        self.refill_pending.load(Ordering::Acquire)
    }
}

/// Clears the topic's pending flag when a background refill ends, however it ends.
struct PendingGuard(Arc<TopicState>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.refill_pending.store(false, Ordering::Release);
    }
}

#[derive(Clone)]
pub struct QuestionBuffer {
    settings: BufferSettings,
    topics: Arc<Mutex<HashMap<String, Arc<TopicState>>>>,
}

impl QuestionBuffer {
    pub fn new(settings: BufferSettings) -> Self {
        Self {
            settings,
            topics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> BufferSettings {
        self.settings
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, Arc<TopicState>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn topic_state(&self, topic: &str) -> Arc<TopicState> {
        let mut topics = self.registry();
        if let Some(state) = topics.get(topic) {
            return state.clone();
        }
        tracing::debug!(topic, "Registering question buffer for new topic");
        let state = Arc::new(TopicState::new());
        topics.insert(topic.to_string(), state.clone());
        state
    }

    fn existing(&self, topic: &str) -> Option<Arc<TopicState>> {
        self.registry().get(topic).cloned()
    }

    /// Makes sure a queue and refill lock exist for `topic`. Safe to call
    /// repeatedly and from many tasks at once.
    pub fn ensure(&self, topic: &str) {
        self.topic_state(topic);
    }

    pub fn topic_count(&self) -> usize {
        self.registry().len()
    }

    pub fn len(&self, topic: &str) -> usize {
        self.existing(topic).map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_refill_pending(&self, topic: &str) -> bool {
        self.existing(topic)
            .map(|s| s.is_refill_pending())
            .unwrap_or(false)
    }

    pub fn snapshot(&self) -> Vec<TopicSnapshot> {
        let states: Vec<(String, Arc<TopicState>)> = self
            .registry()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut out: Vec<TopicSnapshot> = states
            .into_iter()
            .map(|(subject, state)| TopicSnapshot {
                subject,
                queued: state.len(),
                refill_pending: state.is_refill_pending(),
            })
            .collect();
        out.sort_by(|a, b| a.subject.cmp(&b.subject));
        out
    }

    /// Tops up `topic` with one generated batch unless it is already at capacity.
    ///
    /// Returns how many questions were appended. The capacity check happens
    /// after the refill lock is taken, so a refill that queued behind another
    /// one sees the result of the first and usually does nothing.
    pub async fn refill(&self, topic: &str, generator: &dyn QuestionGenerator) -> Result<usize> {
        let state = self.topic_state(topic);
        let _refill = state.refill_lock.lock().await;

        let queued = state.len();
        if queued >= self.settings.capacity {
            tracing::debug!(topic, queued, "Buffer already at capacity, skipping refill");
            return Ok(0);
        }

        let questions = generator.generate(topic).await?;
        if questions.is_empty() {
            tracing::warn!(topic, "Generator returned no questions");
            return Ok(0);
        }

        let added = questions.len();
        let queued = {
            let mut queue = state.queue();
            queue.extend(questions);
            queue.len()
        };
        tracing::info!(topic, added, queued, "Question buffer refilled");
        Ok(added)
    }

    /// Schedules a background refill for `topic` and returns immediately.
    ///
    /// Returns `false` when a background refill for the topic is already pending.
    pub fn warm_up(&self, topic: &str, generator: Arc<dyn QuestionGenerator>) -> bool {
        let state = self.topic_state(topic);
        self.schedule_refill(topic, state, generator)
    }

    fn schedule_refill(
        &self,
        topic: &str,
        state: Arc<TopicState>,
        generator: Arc<dyn QuestionGenerator>,
    ) -> bool {
        if state
            .refill_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(topic, "Background refill already pending");
            return false;
        }

        let buffer = self.clone();
        let topic = topic.to_string();
        tokio::spawn(async move {
            let _pending = PendingGuard(state);
            if let Err(e) = buffer.refill(&topic, generator.as_ref()).await {
                tracing::warn!(topic = %topic, error = %e, "Background refill failed");
            }
        });
        true
    }

    /// Pops the next question for `topic`.
    ///
    /// When the queue is at or below the low-water mark a background refill
    /// is scheduled and the caller is served without waiting for it. When the
    /// queue is empty the caller first waits for an emergency refill, and any
    /// generation error from it is returned as is.
    pub async fn fetch_next(
        &self,
        topic: &str,
        generator: &Arc<dyn QuestionGenerator>,
    ) -> Result<Question> {
        let state = self.topic_state(topic);

        let queued = state.len();
        if queued <= self.settings.low_water_mark {
            if queued == 0 {
                tracing::info!(topic, "Buffer empty, performing emergency fill");
                self.refill(topic, generator.as_ref()).await?;
            }
            self.schedule_refill(topic, state.clone(), generator.clone());
        }

        let next = state.queue().pop_front();
        next.ok_or_else(|| Error::EmptyBuffer(topic.to_string()))
    }
}
