//! Synchronous producer abstraction over `rdkafka`'s `FutureProducer`
//! (spec §4.7: `produce(topic, key, value)` waits for broker ack and
//! returns the first error).

use async_trait::async_trait;
use dts_core::error::{Error, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

/// Capability required of any component that hands records off to the
/// message bus. Kept trait-object-friendly so tests can substitute an
/// in-memory fake.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn produce(&self, topic: &str, key: &str, value: Vec<u8>, timeout: Duration) -> Result<()>;
}

pub struct KafkaProducer {
    inner: FutureProducer,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self> {
        let inner: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "10000")
            .create()
            .map_err(|e| Error::queue_with_source("failed to create Kafka producer", e))?;

        Ok(Self { inner })
    }
}

#[async_trait]
impl Producer for KafkaProducer {
    async fn produce(&self, topic: &str, key: &str, value: Vec<u8>, timeout: Duration) -> Result<()> {
        let record = FutureRecord::to(topic).key(key).payload(&value);

        self.inner
            .send(record, timeout)
            .await
            .map_err(|(e, _)| Error::queue_with_source(format!("produce to {topic} failed"), e))?;

        Ok(())
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// Records every call made to it; optionally fails the next N calls,
    /// used to exercise the scheduler's compensating rollback (spec §4.3
    /// step 3d) without a real broker.
    #[derive(Default)]
    pub struct RecordingProducer {
        pub sent: Mutex<Vec<(String, String, Vec<u8>)>>,
        pub fail_next: Mutex<u32>,
    }

    impl RecordingProducer {
        pub fn fail_next_call(&self) {
            *self.fail_next.lock().unwrap() += 1;
        }
    }

    #[async_trait]
    impl Producer for RecordingProducer {
        async fn produce(&self, topic: &str, key: &str, value: Vec<u8>, _timeout: Duration) -> Result<()> {
            let mut fail_next = self.fail_next.lock().unwrap();
            if *fail_next > 0 {
                *fail_next -= 1;
                return Err(Error::queue("simulated produce failure"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string(), value));
            Ok(())
        }
    }
}
