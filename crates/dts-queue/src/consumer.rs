//! Consumer-group polling abstraction over `rdkafka`'s `StreamConsumer`
//! (spec §4.4/§4.7: group-based, per-record visibility, offset commit
//! per successfully processed record).

use async_trait::async_trait;
use dts_core::error::{Error, Result};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer as _, StreamConsumer};
use rdkafka::message::Message;

/// A single delivered record: the raw payload and a handle the caller
/// uses to commit its offset after the handler succeeds.
pub struct Delivery {
    pub payload: Vec<u8>,
    partition: i32,
    offset: i64,
}

#[async_trait]
pub trait Consumer: Send + Sync {
    /// Blocks until the next record is available or the poll errors.
    async fn poll(&self) -> Result<Delivery>;

    /// Commits the offset for a previously polled delivery. Called only
    /// after the handler completes successfully (at-least-once).
    async fn commit(&self, delivery: &Delivery) -> Result<()>;
}

pub struct KafkaConsumer {
    inner: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    pub fn new(brokers: &str, group: &str, topic: &str) -> Result<Self> {
        let inner: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| Error::queue_with_source("failed to create Kafka consumer", e))?;

        inner
            .subscribe(&[topic])
            .map_err(|e| Error::queue_with_source(format!("failed to subscribe to {topic}"), e))?;

        Ok(Self {
            inner,
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    async fn poll(&self) -> Result<Delivery> {
        let message = self
            .inner
            .recv()
            .await
            .map_err(|e| Error::queue_with_source(format!("poll on {} failed", self.topic), e))?;

        let payload = message.payload().unwrap_or_default().to_vec();
        Ok(Delivery {
            payload,
            partition: message.partition(),
            offset: message.offset(),
        })
    }

    async fn commit(&self, delivery: &Delivery) -> Result<()> {
        use rdkafka::TopicPartitionList;

        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(
            &self.topic,
            delivery.partition,
            rdkafka::Offset::Offset(delivery.offset + 1),
        )
        .map_err(|e| Error::queue_with_source("failed to build offset commit", e))?;

        self.inner
            .commit(&tpl, CommitMode::Sync)
            .map_err(|e| Error::queue_with_source("failed to commit offset", e))
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fakes {
    use super::*;
    use tokio::sync::Mutex;

    /// An in-memory queue of payloads, used by executor tests that feed a
    /// fixed `ScheduledJob` without a real broker.
    pub struct InMemoryConsumer {
        queue: Mutex<std::collections::VecDeque<Vec<u8>>>,
    }

    impl InMemoryConsumer {
        pub fn new(payloads: Vec<Vec<u8>>) -> Self {
            Self {
                queue: Mutex::new(payloads.into()),
            }
        }
    }

    #[async_trait]
    impl Consumer for InMemoryConsumer {
        async fn poll(&self) -> Result<Delivery> {
            let mut queue = self.queue.lock().await;
            match queue.pop_front() {
                Some(payload) => Ok(Delivery {
                    payload,
                    partition: 0,
                    offset: 0,
                }),
                None => Err(Error::queue("no more fake messages")),
            }
        }

        async fn commit(&self, _delivery: &Delivery) -> Result<()> {
            Ok(())
        }
    }
}
