//! # Publish stage.
//!
//! Drains the publish queue and hands each record to the [`Publish`] link.
//!
//! ```text
//! loop {
//!   ├─► records.recv()                  (cancellable)
//!   │     └─ None → QueueClosed, idle until cancelled
//!   ├─► topic   = <base>/<channel index>
//!   ├─► payload = tick in decimal ASCII
//!   ├─► link.publish(topic, payload)    (one attempt, no retry)
//!   │     ├─ Ok  → Published
//!   │     └─ Err → PublishFailed
//!   └─► record dropped here, whatever the outcome
//! }
//! ```
//!
//! The publisher never recreates its queue: an unusable queue parks the task
//! until the supervisor tears the pipeline down.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::publish::{Publish, PublishRecord, RecordReceiver};
use crate::tasks::Task;

/// Consumer of the publish queue.
pub struct Publisher {
    records: Mutex<RecordReceiver>,
    link: Arc<dyn Publish>,
    base_topic: String,
    bus: Bus,
}

impl Publisher {
    /// Task name used in events.
    pub const NAME: &'static str = "publisher";

    /// Creates a publisher sending to `<base_topic>/<channel>`.
    pub fn new(
        records: RecordReceiver,
        link: Arc<dyn Publish>,
        base_topic: impl Into<String>,
        bus: Bus,
    ) -> Self {
        Self {
            records: Mutex::new(records),
            link,
            base_topic: base_topic.into(),
            bus,
        }
    }

    /// Publishes one record and releases it.
    async fn deliver(&self, record: PublishRecord) {
        let topic = record.topic(&self.base_topic);
        let (kind, reason) = match self.link.publish(&topic, record.payload()).await {
            Ok(()) => (EventKind::Published, topic),
            Err(e) => (EventKind::PublishFailed, format!("{topic}: {e}")),
        };
        self.bus.publish(
            Event::new(kind)
                .with_task(Self::NAME)
                .with_channel(record.channel())
                .with_tick(record.tick())
                .with_reason(reason),
        );
    }
}

#[async_trait]
impl Task for Publisher {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let mut records = self.records.lock().await;

        loop {
            let next = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                next = records.recv() => next,
            };
            let Some(record) = next else {
                self.bus.publish(
                    Event::new(EventKind::QueueClosed)
                        .with_task(Self::NAME)
                        .with_reason("publish queue has no producer"),
                );
                ctx.cancelled().await;
                return Ok(());
            };

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                _ = self.deliver(record) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::channel::ChannelId;
    use crate::error::PublishError;
    use crate::publish::PublishQueue;
    use crate::testkit::{RecordingLink, drain_kinds};

    fn publisher(link: &Arc<RecordingLink>, bus: &Bus) -> (PublishQueue, Arc<Publisher>) {
        let (queue, records) = PublishQueue::new(32);
        let publisher = Arc::new(Publisher::new(
            records,
            link.clone(),
            "button/pressed",
            bus.clone(),
        ));
        (queue, publisher)
    }

    fn spawn(
        publisher: &Arc<Publisher>,
    ) -> (CancellationToken, tokio::task::JoinHandle<Result<(), TaskError>>) {
        let ctx = CancellationToken::new();
        let handle = tokio::spawn({
            let ctx = ctx.clone();
            let publisher = Arc::clone(publisher);
            async move { publisher.run(ctx).await }
        });
        (ctx, handle)
    }

    #[tokio::test]
    async fn publishes_topic_and_decimal_payload() {
        let bus = Bus::new(64);
        let link = Arc::new(RecordingLink::connected());
        let (queue, publisher) = publisher(&link, &bus);
        let (ctx, handle) = spawn(&publisher);

        queue
            .submit(PublishRecord::new(ChannelId::TEAM0, 42))
            .await
            .unwrap();
        queue
            .submit(PublishRecord::new(ChannelId::TEAM1, 7))
            .await
            .unwrap();

        let sent = link.wait_for_calls(2).await;
        assert_eq!(
            sent,
            vec![
                ("button/pressed/0".to_string(), Bytes::from_static(b"42")),
                ("button/pressed/1".to_string(), Bytes::from_static(b"7")),
            ]
        );

        ctx.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn failed_publish_is_reported_and_not_retried() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let link = Arc::new(RecordingLink::connected());
        link.answer_next(Err(PublishError::NotConnected));
        let (queue, publisher) = publisher(&link, &bus);
        let (ctx, handle) = spawn(&publisher);

        queue
            .submit(PublishRecord::new(ChannelId::TEAM0, 1))
            .await
            .unwrap();
        queue
            .submit(PublishRecord::new(ChannelId::TEAM0, 2))
            .await
            .unwrap();

        let sent = link.wait_for_calls(2).await;
        ctx.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1, Bytes::from_static(b"1"));
        assert_eq!(sent[1].1, Bytes::from_static(b"2"));
        assert_eq!(link.sent().len(), 2);

        let kinds = drain_kinds(&mut events);
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == EventKind::PublishFailed)
                .count(),
            1
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::Published).count(),
            1
        );
    }

    #[tokio::test]
    async fn closed_queue_idles_until_cancelled() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let link = Arc::new(RecordingLink::connected());
        let (queue, publisher) = publisher(&link, &bus);
        drop(queue);

        let (ctx, handle) = spawn(&publisher);
        loop {
            if events.recv().await.unwrap().kind == EventKind::QueueClosed {
                break;
            }
        }
        assert!(!handle.is_finished());
        assert!(link.sent().is_empty());

        ctx.cancel();
        handle.await.unwrap().unwrap();
    }
}
