use async_trait::async_trait;
use log::debug;
use tokio::sync::mpsc;

use crate::errors::ExportResult;

/// Cursor-driven batch source for streaming exports.
///
/// `fetch` is called with `None` first, then with the cursor derived from
/// the last record of the previous batch. Returning an empty batch is the
/// stream's sole normal termination signal.
#[async_trait]
pub trait RecordSource<T>: Send {
    type Cursor: Send;

    async fn fetch(&mut self, cursor: Option<Self::Cursor>) -> ExportResult<Vec<T>>;

    /// Derive the continuation cursor from the last record of a batch.
    fn next_cursor(&self, last: &T) -> Self::Cursor;
}

/// Spawn the background producer: repeatedly fetch batches and push the
/// records one by one into a bounded channel.
///
/// The channel closing is the termination signal; there is no separate
/// finished flag. A fetch error is delivered through the same channel and
/// stops the producer, so the consumer always observes either every record
/// in fetch order or a prefix followed by the error. The bounded send
/// applies backpressure to a source that outpaces the consumer.
pub fn spawn_records<T, S>(mut source: S, capacity: usize) -> mpsc::Receiver<ExportResult<T>>
where
    T: Send + 'static,
    S: RecordSource<T> + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    tokio::spawn(async move {
        let mut cursor: Option<S::Cursor> = None;
        loop {
            let batch = match source.fetch(cursor.take()).await {
                Ok(batch) => batch,
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            };
            if batch.is_empty() {
                return;
            }
            debug!("fetched batch of {} records", batch.len());
            cursor = batch.last().map(|last| source.next_cursor(last));
            for record in batch {
                if tx.send(Ok(record)).await.is_err() {
                    // Consumer dropped the receiver; nothing left to do.
                    return;
                }
            }
        }
    });
    rx
}
