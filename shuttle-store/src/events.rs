use async_trait::async_trait;
use chrono::Utc;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::Serialize;
use shuttle_core::{Notification, Notifier, NotifyError};
use shuttle_shared::models::NotificationRequestedEvent;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("kafka: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
    #[error("encode: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }

    pub async fn publish_json<T: Serialize>(&self, topic: &str, key: &str, event: &T) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        Ok(self.publish(topic, key, &payload).await?)
    }
}

/// Hands notifications to the mail relay through a Kafka topic.
pub struct KafkaNotifier {
    producer: EventProducer,
    topic: String,
}

impl KafkaNotifier {
    pub fn new(producer: EventProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl Notifier for KafkaNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let event = NotificationRequestedEvent {
            notification_id: Uuid::new_v4(),
            recipient: notification.recipient.clone(),
            subject: notification.subject.clone(),
            body: notification.body.clone(),
            requested_at: Utc::now(),
        };
        let key = event.notification_id.to_string();

        self.producer
            .publish_json(&self.topic, &key, &event)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}
