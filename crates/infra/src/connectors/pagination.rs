//! Offset-based page walking shared by the CRM connectors.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use syncline_domain::{Result, SynclineError};
use tracing::{debug, warn};

/// Fetch every page of an offset-paginated collection.
///
/// `fetch_page` receives the current offset and returns the items on that
/// page. The walk stops when a page comes back shorter than `page_size`
/// (including empty), which covers APIs that omit a reliable total count.
/// A fixed `page_delay` is applied between page requests to stay under the
/// provider's rate limits. Any page failure aborts the whole walk with an
/// error naming the failing offset; the error class is preserved.
pub async fn fetch_all_pages<F, Fut>(
    page_size: usize,
    page_delay: Duration,
    mut fetch_page: F,
) -> Result<Vec<Value>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<Value>>>,
{
    if page_size == 0 {
        return Err(SynclineError::InvalidInput("page size must be greater than zero".into()));
    }

    let mut items = Vec::new();
    let mut offset = 0usize;

    loop {
        let page = fetch_page(offset).await.map_err(|err| {
            warn!(offset, error = %err, "page fetch failed, aborting walk");
            with_offset_context(err, offset)
        })?;

        let fetched = page.len();
        debug!(offset, fetched, "fetched page");
        items.extend(page);

        if fetched < page_size {
            break;
        }

        offset += page_size;
        if !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
    }

    Ok(items)
}

/// Prefix the failing offset onto the error message without changing the
/// error class, so callers can still dispatch on auth vs transport failures.
fn with_offset_context(err: SynclineError, offset: usize) -> SynclineError {
    let wrap = |msg: String| format!("page fetch at offset {offset} failed: {msg}");
    match err {
        SynclineError::Config(m) => SynclineError::Config(wrap(m)),
        SynclineError::Network(m) => SynclineError::Network(wrap(m)),
        SynclineError::Auth(m) => SynclineError::Auth(wrap(m)),
        SynclineError::NotFound(m) => SynclineError::NotFound(wrap(m)),
        SynclineError::InvalidInput(m) => SynclineError::InvalidInput(wrap(m)),
        SynclineError::Unsupported(m) => SynclineError::Unsupported(wrap(m)),
        SynclineError::Internal(m) => SynclineError::Internal(wrap(m)),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    fn page_of(start: usize, len: usize) -> Vec<Value> {
        (start..start + len).map(|i| json!({ "id": i })).collect()
    }

    #[tokio::test]
    async fn walks_until_a_short_page() {
        let calls = AtomicUsize::new(0);
        let items = fetch_all_pages(10, Duration::ZERO, |offset| {
            calls.fetch_add(1, Ordering::SeqCst);
            let len = match offset {
                0 | 10 => 10,
                20 => 5,
                other => panic!("unexpected offset {other}"),
            };
            async move { Ok(page_of(offset, len)) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 25);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_confirming_empty_page() {
        let calls = AtomicUsize::new(0);
        let items = fetch_all_pages(10, Duration::ZERO, |offset| {
            calls.fetch_add(1, Ordering::SeqCst);
            let len = if offset < 20 { 10 } else { 0 };
            async move { Ok(page_of(offset, len)) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 20);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_short_page_stops_immediately() {
        let calls = AtomicUsize::new(0);
        let items = fetch_all_pages(100, Duration::ZERO, |offset| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok(page_of(offset, 3)) }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mid_walk_failure_names_the_offset_and_keeps_the_class() {
        let result = fetch_all_pages(10, Duration::ZERO, |offset| async move {
            if offset == 10 {
                Err(SynclineError::Auth("token revoked".into()))
            } else {
                Ok(page_of(offset, 10))
            }
        })
        .await;

        match result {
            Err(SynclineError::Auth(msg)) => {
                assert!(msg.contains("offset 10"));
                assert!(msg.contains("token revoked"));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_page_size_is_rejected() {
        let result =
            fetch_all_pages(0, Duration::ZERO, |offset| async move { Ok(page_of(offset, 0)) })
                .await;
        assert!(matches!(result, Err(SynclineError::InvalidInput(_))));
    }
}
