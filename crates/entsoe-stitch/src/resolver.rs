//! Recursive interval bisection for requests the provider refuses as too large.

use std::future::Future;

use chrono::TimeDelta;
use futures::FutureExt;
use futures::future::BoxFuture;

use entsoe_types::{EntsoeError, Frame, Interval, Result};

/// Bounds on how far a window may be bisected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    /// Maximum recursion depth.
    pub max_depth: u32,
    /// Windows this short or shorter are never split.
    pub min_span: TimeDelta,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            max_depth: 24,
            min_span: TimeDelta::hours(1),
        }
    }
}

/// Fetches `window`, bisecting it whenever the provider answers with
/// [`EntsoeError::PaginationRequired`].
///
/// Halves are resolved in order (left, then right) and concatenated. Any other
/// error propagates unchanged.
///
/// # Errors
///
/// Returns [`EntsoeError::PaginationLimitExceeded`] once `limits` forbid another
/// split, or the first non-pagination error from `fetch`.
pub fn resolve<'a, F, Fut>(
    fetch: &'a F,
    window: Interval,
    limits: PaginationLimits,
) -> BoxFuture<'a, Result<Frame>>
where
    F: Fn(Interval) -> Fut + Sync,
    Fut: Future<Output = Result<Frame>> + Send + 'a,
{
    step(fetch, window, limits, 0)
}

fn step<'a, F, Fut>(
    fetch: &'a F,
    window: Interval,
    limits: PaginationLimits,
    depth: u32,
) -> BoxFuture<'a, Result<Frame>>
where
    F: Fn(Interval) -> Fut + Sync,
    Fut: Future<Output = Result<Frame>> + Send + 'a,
{
    async move {
        match fetch(window).await {
            Err(EntsoeError::PaginationRequired { requested, allowed }) => {
                if depth >= limits.max_depth || window.duration() <= limits.min_span {
                    return Err(EntsoeError::PaginationLimitExceeded {
                        start: window.start_utc(),
                        end: window.end_utc(),
                        depth,
                    });
                }
                tracing::debug!(
                    %window,
                    depth,
                    ?requested,
                    ?allowed,
                    "request too large, bisecting"
                );
                let (left, right) = window.bisect();
                let mut frame = step(fetch, left, limits, depth + 1).await?;
                frame.append(step(fetch, right, limits, depth + 1).await?);
                Ok(frame)
            }
            other => other,
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::UTC;
    use entsoe_types::Timestamp;
    use std::sync::Mutex;

    fn hour(n: i64) -> Timestamp {
        UTC.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + TimeDelta::hours(n)
    }

    /// Provider with one item per hour that refuses windows holding more than `limit` items.
    struct Provider {
        limit: usize,
        calls: Mutex<Vec<Interval>>,
    }

    impl Provider {
        fn new(limit: usize) -> Self {
            Self {
                limit,
                calls: Mutex::default(),
            }
        }

        async fn fetch(&self, window: Interval) -> Result<Frame> {
            self.calls.lock().unwrap().push(window);
            let points: Vec<_> = (0..48)
                .map(hour)
                .filter(|t| window.contains(t))
                .map(|t| (t, t.timestamp() as f64))
                .collect();
            if points.len() > self.limit {
                return Err(EntsoeError::PaginationRequired {
                    requested: Some(points.len() as u64),
                    allowed: Some(self.limit as u64),
                });
            }
            Ok(Frame::from_series("v", points))
        }
    }

    #[tokio::test]
    async fn test_resolves_every_item_once() {
        let provider = Provider::new(5);
        let fetch = |window| provider.fetch(window);
        let window = Interval::new(hour(0), hour(24)).unwrap();

        let frame = resolve(&fetch, window, PaginationLimits::default())
            .await
            .unwrap();

        let expected: Vec<_> = (0..24).map(hour).collect();
        assert_eq!(frame.timestamps(), expected);
        assert!(!frame.has_duplicates());
        // 24 -> 12 -> 6 -> 3: 1 + 2 + 4 + 8 requests
        assert_eq!(provider.calls.lock().unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let fetch = |_window| async { Err::<Frame, _>(EntsoeError::NoData) };
        let window = Interval::new(hour(0), hour(24)).unwrap();

        let result = resolve(&fetch, window, PaginationLimits::default()).await;
        assert!(matches!(result, Err(EntsoeError::NoData)));
    }

    #[tokio::test]
    async fn test_depth_is_bounded() {
        let fetch = |_window| async {
            Err::<Frame, _>(EntsoeError::PaginationRequired {
                requested: None,
                allowed: None,
            })
        };
        let window = Interval::new(hour(0), hour(24)).unwrap();
        let limits = PaginationLimits {
            max_depth: 2,
            min_span: TimeDelta::minutes(1),
        };

        match resolve(&fetch, window, limits).await {
            Err(EntsoeError::PaginationLimitExceeded { depth, .. }) => assert_eq!(depth, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_min_span_stops_splitting() {
        let provider = Provider::new(0);
        let fetch = |window| provider.fetch(window);
        let window = Interval::new(hour(0), hour(4)).unwrap();

        let result = resolve(&fetch, window, PaginationLimits::default()).await;
        assert!(matches!(
            result,
            Err(EntsoeError::PaginationLimitExceeded { depth: 2, .. })
        ));
    }
}
