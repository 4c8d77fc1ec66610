//! FileJobQueue - state file の `queues` に載る topic ごとの FIFO
//!
//! enqueue / dequeue はそれぞれ 1 トランザクション。
//! tail に追加し head から取り出すので、同一 topic 内の順序は enqueue 順になります。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::config::{Config, DEFAULT_POLL_INTERVAL};
use crate::domain::{JobId, JobPayload, QueueJob};
use crate::error::{Result, RollcallError};
use crate::ports::{JobHandler, JobQueue};
use crate::store::JsonFileStore;

/// Retry policy for failed handler runs.
///
/// `max_attempts = 1` (default): a failed job is logged and dropped.
/// Larger values put the job back at the tail of its topic until the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self { max_attempts: 1 }
    }

    /// `attempts` は今回の失敗を含む配送回数
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

pub struct FileJobQueue {
    store: Arc<JsonFileStore>,
    poll_interval: Duration,
    retry: RetryPolicy,
}

impl FileJobQueue {
    pub fn new(store: Arc<JsonFileStore>) -> Self {
        Self {
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(store: Arc<JsonFileStore>, config: &Config) -> Self {
        Self::new(store)
            .with_poll_interval(config.poll_interval)
            .with_retry(RetryPolicy {
                max_attempts: config.max_attempts,
            })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn requeue(&self, topic: &str, job: QueueJob) -> Result<()> {
        self.store
            .transaction(|state| {
                state.queues.entry(topic.to_string()).or_default().push_back(job);
                Ok(())
            })
            .await
    }

    /// 1 件を handler に渡す。handler の失敗はここで吸収する
    async fn deliver(&self, topic: &str, mut job: QueueJob, handler: &dyn JobHandler) -> Result<()> {
        let Err(err) = handler.handle(&job.payload).await else {
            tracing::debug!(topic, job_id = %job.id, "queue job processed");
            return Ok(());
        };

        job.attempts += 1;
        if self.retry.should_retry(job.attempts) {
            tracing::warn!(
                topic,
                job_id = %job.id,
                attempts = job.attempts,
                max_attempts = self.retry.max_attempts,
                error = %err,
                "queue job failed, requeueing"
            );
            return self.requeue(topic, job).await;
        }

        tracing::error!(
            topic,
            job_id = %job.id,
            attempts = job.attempts,
            error = %err,
            "failed to process queue payload, dropping job"
        );
        Ok(())
    }
}

#[async_trait]
impl JobQueue for FileJobQueue {
    async fn enqueue(&self, topic: &str, payload: JobPayload) -> Result<JobId> {
        self.store
            .transaction(|state| {
                let job = QueueJob::new(self.store.generate_id(), payload, self.store.now());
                let id = job.id.clone();
                state.queues.entry(topic.to_string()).or_default().push_back(job);
                Ok(id)
            })
            .await
    }

    async fn dequeue(&self, topic: &str) -> Result<Option<QueueJob>> {
        self.store
            .transaction(|state| {
                Ok::<_, RollcallError>(state.queues.get_mut(topic).and_then(|q| q.pop_front()))
            })
            .await
    }

    async fn depth(&self, topic: &str) -> Result<usize> {
        let depth = self
            .store
            .read_only(|state| state.queues.get(topic).map_or(0, |q| q.len()))
            .await?;
        Ok(depth)
    }

    async fn consume(
        &self,
        topic: &str,
        handler: &dyn JobHandler,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        tracing::info!(topic, poll_ms = self.poll_interval.as_millis() as u64, "consumer started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let Some(job) = self.dequeue(topic).await? else {
                // 空なら poll interval 待つ（shutdown が来たら即座に起きる）
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                continue;
            };

            self.deliver(topic, job, handler).await?;
        }
        tracing::info!(topic, "consumer stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WriteMode;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn queue_in(dir: &tempfile::TempDir) -> FileJobQueue {
        let store = JsonFileStore::new(dir.path().join("store.json"), WriteMode::InPlace);
        FileJobQueue::new(Arc::new(store)).with_poll_interval(Duration::from_millis(10))
    }

    fn payload(value: serde_json::Value) -> JobPayload {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    /// 受け取った payload を記録し、`stop_after` 件で shutdown を送る
    struct RecordingHandler {
        seen: Mutex<Vec<JobPayload>>,
        failures_left: AtomicU32,
        stop_after: usize,
        shutdown: watch::Sender<bool>,
    }

    impl RecordingHandler {
        fn new(stop_after: usize, failures: u32, shutdown: watch::Sender<bool>) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                failures_left: AtomicU32::new(failures),
                stop_after,
                shutdown,
            }
        }

        fn seen(&self) -> Vec<JobPayload> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobHandler for RecordingHandler {
        async fn handle(&self, payload: &JobPayload) -> Result<()> {
            let count = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(payload.clone());
                seen.len()
            };
            if count >= self.stop_after {
                let _ = self.shutdown.send(true);
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(RollcallError::Handler(format!("intentional failure (left={left})")));
            }
            Ok(())
        }
    }

    async fn consume_with_timeout(
        queue: &FileJobQueue,
        topic: &str,
        handler: &RecordingHandler,
        rx: watch::Receiver<bool>,
    ) {
        tokio::time::timeout(Duration::from_secs(5), queue.consume(topic, handler, rx))
            .await
            .expect("consumer did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn dequeue_returns_jobs_in_enqueue_order() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);

        for n in 0..5 {
            queue.enqueue("t", payload(json!({ "n": n }))).await.unwrap();
        }
        assert_eq!(queue.depth("t").await.unwrap(), 5);

        for n in 0..5 {
            let job = queue.dequeue("t").await.unwrap().unwrap();
            assert_eq!(job.payload["n"], n);
        }
        assert_eq!(queue.dequeue("t").await.unwrap(), None);
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        queue.enqueue("a", payload(json!({"lane": "a"}))).await.unwrap();
        queue.enqueue("b", payload(json!({"lane": "b"}))).await.unwrap();

        let b = queue.dequeue("b").await.unwrap().unwrap();
        assert_eq!(b.payload["lane"], "b");
        assert_eq!(queue.depth("a").await.unwrap(), 1);
        assert_eq!(queue.dequeue("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn enqueued_job_is_persisted_under_its_topic() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        let id = queue.enqueue("audit:jobs", payload(json!({"action": "x"}))).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("store.json")).unwrap())
                .unwrap();
        let job = &raw["queues"]["audit:jobs"][0];
        assert_eq!(job["id"], id.as_str());
        assert_eq!(job["payload"]["action"], "x");
        assert!(job["enqueuedAt"].is_string());
    }

    #[tokio::test]
    async fn consumer_delivers_the_exact_payload_and_drains_the_topic() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        let sent = payload(json!({
            "action": "attendance.sign-in",
            "employerId": "e1",
            "shiftId": "s1"
        }));
        queue.enqueue("audit:jobs", sent.clone()).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handler = RecordingHandler::new(1, 0, tx);
        consume_with_timeout(&queue, "audit:jobs", &handler, rx).await;

        assert_eq!(handler.seen(), vec![sent]);
        assert_eq!(queue.depth("audit:jobs").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failing_handler_drops_job_and_keeps_consuming() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        queue.enqueue("t", payload(json!({"n": 1}))).await.unwrap();
        queue.enqueue("t", payload(json!({"n": 2}))).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handler = RecordingHandler::new(2, 1, tx);
        consume_with_timeout(&queue, "t", &handler, rx).await;

        let seen: Vec<_> = handler.seen().iter().map(|p| p["n"].clone()).collect();
        assert_eq!(seen, vec![json!(1), json!(2)]);
        // 既定ポリシーでは失敗した job は戻らない
        assert_eq!(queue.depth("t").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn retry_policy_requeues_until_max_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir).with_retry(RetryPolicy { max_attempts: 3 });
        queue.enqueue("t", payload(json!({"n": 1}))).await.unwrap();

        let (tx, rx) = watch::channel(false);
        let handler = RecordingHandler::new(3, u32::MAX, tx);
        consume_with_timeout(&queue, "t", &handler, rx).await;

        assert_eq!(handler.seen().len(), 3);
        assert_eq!(queue.depth("t").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn requeued_job_records_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir).with_retry(RetryPolicy { max_attempts: 5 });
        queue.enqueue("t", payload(json!({"n": 1}))).await.unwrap();

        let (tx, _rx) = watch::channel(false);
        let handler = RecordingHandler::new(usize::MAX, 1, tx);
        let job = queue.dequeue("t").await.unwrap().unwrap();
        queue.deliver("t", job, &handler).await.unwrap();

        let again = queue.dequeue("t").await.unwrap().unwrap();
        assert_eq!(again.attempts, 1);
    }

    #[tokio::test]
    async fn consumer_waits_for_late_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let queue = Arc::new(queue_in(&dir));
        let (tx, rx) = watch::channel(false);
        let handler = Arc::new(RecordingHandler::new(1, 0, tx));

        let consumer = tokio::spawn({
            let queue = Arc::clone(&queue);
            let handler = Arc::clone(&handler);
            async move { queue.consume("t", handler.as_ref(), rx).await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.enqueue("t", payload(json!({"late": true}))).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .expect("consumer did not stop")
            .unwrap()
            .unwrap();
        assert_eq!(handler.seen()[0]["late"], true);
    }

    #[tokio::test]
    async fn dropping_the_sender_stops_an_idle_consumer() {
        let dir = tempfile::tempdir().unwrap();
        let queue = queue_in(&dir);
        let (tx, rx) = watch::channel(false);
        let (unused_tx, _) = watch::channel(false);
        let handler = RecordingHandler::new(usize::MAX, 0, unused_tx);
        drop(tx);

        consume_with_timeout(&queue, "t", &handler, rx).await;
        assert!(handler.seen().is_empty());
    }

    #[test]
    fn retry_policy_counts_the_current_failure() {
        let policy = RetryPolicy { max_attempts: 2 };
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!RetryPolicy::default().should_retry(1));
    }
}
