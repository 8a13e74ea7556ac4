//! `TaskManager`: a pool of consumer processors bound to the primary and
//! retry topics (spec §4.4).
//!
//! Per spec §9's re-architecture guidance, there is no separate
//! `TaskConsumer`/`TaskRetryConsumer` type hierarchy — a single
//! `Processor` capability ("start/stop a loop bound to topic T with a
//! per-record handler H") covers both, selected by passing the primary
//! or retry handler closure.

use dts_core::error::{Error, Result};
use dts_queue::Consumer;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A per-record handler. Returning `Ok(())` signals the consumer loop to
/// commit the record's offset; `Err` leaves it uncommitted for
/// redelivery (spec §4.4: offset commit only after handler success).
pub type Handler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// One consumer loop bound to a topic/group and a handler.
pub struct Processor {
    name: String,
    consumer: Arc<dyn Consumer>,
    handler: Handler,
}

impl Processor {
    pub fn new(name: impl Into<String>, consumer: Arc<dyn Consumer>, handler: Handler) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            consumer,
            handler,
        })
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(processor = %self.name, "processor started");

        loop {
            let delivery = tokio::select! {
                result = self.consumer.poll() => result,
                _ = cancel.cancelled() => break,
            };

            match delivery {
                Ok(delivery) => {
                    let outcome = (self.handler)(delivery.payload.clone()).await;
                    match outcome {
                        Ok(()) => {
                            if let Err(e) = self.consumer.commit(&delivery).await {
                                tracing::error!(processor = %self.name, error = %e, "offset commit failed");
                            }
                        }
                        Err(e) => {
                            tracing::error!(
                                processor = %self.name,
                                error = %e,
                                "handler failed, offset will not be committed"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(processor = %self.name, error = %e, "poll failed");
                }
            }
        }

        tracing::info!(processor = %self.name, "processor stopped");
    }
}

/// Owns the processor registry behind a read-write lock: readers are the
/// starters/stoppers, writers are `add_processor` calls (spec §5).
pub struct TaskManager {
    processors: RwLock<HashMap<String, Arc<Processor>>>,
    handles: AsyncMutex<HashMap<String, JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            processors: RwLock::new(HashMap::new()),
            handles: AsyncMutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Registers a processor under `name`. A no-op if one is already
    /// registered under that name.
    pub fn add_processor(&self, processor: Arc<Processor>) {
        let mut registry = self.processors.write();
        registry.entry(processor.name.clone()).or_insert(processor);
    }

    /// Launches every registered processor's poll loop. Idempotent per
    /// name: starting an already-running processor is a no-op.
    pub async fn start_all(&self) {
        let processors: Vec<Arc<Processor>> = self.processors.read().values().cloned().collect();
        let mut handles = self.handles.lock().await;

        for processor in processors {
            if handles.contains_key(&processor.name) {
                continue;
            }
            let cancel = self.cancel.child_token();
            let name = processor.name.clone();
            let handle = tokio::spawn(processor.run(cancel));
            handles.insert(name, handle);
        }
    }

    /// Cancels every processor's loop and awaits its completion,
    /// aggregating join errors (spec §5: shutdown cancels the root
    /// context, processors stop, errors during stop are aggregated).
    pub async fn stop_all(&self) -> Result<()> {
        self.cancel.cancel();

        let mut handles = self.handles.lock().await;
        let mut errors = Vec::new();
        for (name, handle) in handles.drain() {
            if let Err(e) = handle.await {
                errors.push(format!("{name}: {e}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::internal(format!(
                "errors stopping processors: {}",
                errors.join("; ")
            )))
        }
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dts_queue::consumer::fakes::InMemoryConsumer;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn start_all_drains_registered_processor_then_stop_all_returns() {
        let consumer = Arc::new(InMemoryConsumer::new(vec![b"payload-1".to_vec(), b"payload-2".to_vec()]));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();

        let handler: Handler = Arc::new(move |_payload| {
            let seen = seen_clone.clone();
            Box::pin(async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        });

        let manager = TaskManager::new();
        manager.add_processor(Processor::new("primary", consumer, handler));
        manager.start_all().await;

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while seen.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("handler should process both fake messages");

        manager.stop_all().await.unwrap();
    }

    #[test]
    fn add_processor_is_idempotent_by_name() {
        let manager = TaskManager::new();
        let consumer = Arc::new(InMemoryConsumer::new(vec![]));
        let handler: Handler = Arc::new(|_| Box::pin(async { Ok(()) }));

        manager.add_processor(Processor::new("primary", consumer.clone(), handler.clone()));
        manager.add_processor(Processor::new("primary", consumer, handler));

        assert_eq!(manager.processors.read().len(), 1);
    }
}
