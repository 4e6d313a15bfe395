use std::future::Future;

use anyhow::Result;
use futures::future::join_all;

/// A batch run that stopped early. `committed` counts only records from
/// batches that completed in full.
#[derive(Debug)]
pub(crate) struct BatchFailure {
    pub committed: usize,
    pub source: anyhow::Error,
}

/// Write items in fixed-size batches.
///
/// Within one batch the writes run concurrently and the call waits for
/// all of them before moving on (full-batch barrier). The first error
/// wins; sibling failures in the same batch are logged. Remaining
/// batches never start and there are no retries.
pub(crate) async fn write_batches<T, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    write: F,
) -> Result<usize, BatchFailure>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let total = items.len();
    let mut committed = 0usize;

    for chunk in items.chunks(batch_size.max(1)) {
        let results = join_all(chunk.iter().cloned().map(|item| write(item))).await;

        let mut first_error = None;
        for result in results {
            if let Err(err) = result {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::warn!(error = %err, "Additional write failure in the same batch");
                }
            }
        }
        if let Some(source) = first_error {
            return Err(BatchFailure { committed, source });
        }

        committed += chunk.len();
        tracing::debug!(committed, total, "Batch committed");
    }

    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn writes_everything_in_order_of_batches() {
        let written = Arc::new(AtomicUsize::new(0));
        let counter = written.clone();

        let committed = write_batches((0..7).collect::<Vec<_>>(), 3, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

        assert_eq!(committed, 7);
        assert_eq!(written.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn failed_batch_stops_the_run_and_reports_prior_batches() {
        let attempted = Arc::new(AtomicUsize::new(0));
        let counter = attempted.clone();

        // Batch size 2: items 0..2 succeed, item 2 (second batch) fails.
        let err = write_batches((0..6).collect::<Vec<_>>(), 2, move |item: i32| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                if item == 2 {
                    bail!("disk full");
                }
                Ok(())
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.committed, 2, "only the first full batch counts");
        assert!(err.source.to_string().contains("disk full"));
        // The third batch (items 4, 5) must never start.
        assert_eq!(attempted.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn first_error_wins_when_several_fail_in_one_batch() {
        let err = write_batches(vec!["a", "b", "c"], 3, |item: &str| async move {
            bail!("write {item} failed")
        })
        .await
        .unwrap_err();

        assert_eq!(err.committed, 0);
        assert!(err.source.to_string().contains("write a failed"));
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let committed = write_batches(Vec::<i32>::new(), 50, |_| async { Ok(()) })
            .await
            .unwrap();
        assert_eq!(committed, 0);
    }
}
