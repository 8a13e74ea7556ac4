//! The message-bus adapter: a `Producer`/`Consumer` abstraction over
//! `rdkafka`, the `ScheduledJob` wire envelope, and the topic/group
//! constants of spec §4.4/§4.7.

pub mod consumer;
pub mod envelope;
pub mod producer;
pub mod topics;

pub use consumer::{Consumer, Delivery, KafkaConsumer};
pub use envelope::ScheduledJob;
pub use producer::{KafkaProducer, Producer};
