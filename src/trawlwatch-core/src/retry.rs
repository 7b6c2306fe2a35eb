use crate::{CoreResult, Error};
use backon::{ConstantBuilder, Retryable};
use futures::Future;
use std::time::Duration;

pub trait IsTimeout {
    fn is_timeout(&self) -> bool;
}

impl IsTimeout for Error {
    fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

pub async fn retry<T, Fut, FutureFn, E>(fut: FutureFn) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    FutureFn: FnMut() -> Fut,
    E: IsTimeout,
{
    fut.retry(
        ConstantBuilder::default()
            .with_delay(Duration::from_millis(10))
            .with_max_times(3),
    )
    .when(|e| e.is_timeout())
    .await
}

/// Bounds a single spatial/persistence call with `timeout` and retries it when it times out.
pub async fn retry_with_timeout<T, Fut, FutureFn>(
    timeout: Duration,
    mut fut: FutureFn,
) -> CoreResult<T>
where
    Fut: Future<Output = CoreResult<T>>,
    FutureFn: FnMut() -> Fut,
{
    retry(|| {
        let call = fut();
        async move { tokio::time::timeout(timeout, call).await? }
    })
    .await
}
