//! Chunked fetch-and-stitch orchestration.

use async_trait::async_trait;
use chrono_tz::Tz;

use entsoe_types::{EntsoeError, Frame, Granularity, Interval, Result};

use crate::{DuplicatePolicy, OffsetPaging, PaginationLimits, normalize, paginate, resolve};

/// A fetch-and-decode step for one endpoint.
#[async_trait]
pub trait Source: Send + Sync {
    /// Fetches and decodes one window, optionally at a document offset.
    async fn fetch(&self, window: Interval, offset: Option<u32>) -> Result<Frame>;
}

/// Per-endpoint stitching configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointPolicy {
    /// Calendar granularity of request blocks; `None` sends the interval whole.
    pub granularity: Option<Granularity>,
    /// Trim each block's result to its own boundaries.
    pub truncate_blocks: bool,
    /// Bisect windows the provider refuses as too large.
    pub bisect: bool,
    /// Document-offset paging, for endpoints that need it.
    pub offset: Option<OffsetPaging>,
    /// Merge applied across blocks.
    pub merge: DuplicatePolicy,
    /// Trim the final result to the requested interval.
    pub truncate: bool,
}

impl Default for EndpointPolicy {
    fn default() -> Self {
        Self::yearly()
    }
}

impl EndpointPolicy {
    /// Year blocks, boundary truncation, first row wins.
    #[must_use]
    pub const fn yearly() -> Self {
        Self {
            granularity: Some(Granularity::Year),
            truncate_blocks: true,
            bisect: false,
            offset: None,
            merge: DuplicatePolicy::KeepFirst,
            truncate: true,
        }
    }

    /// Day blocks, for endpoints limited to a single day per request.
    ///
    /// Blocks are not trimmed; the cross-block merge absorbs any shared midnight.
    #[must_use]
    pub const fn daily() -> Self {
        Self {
            granularity: Some(Granularity::Day),
            truncate_blocks: false,
            ..Self::yearly()
        }
    }

    /// A single request with no stitching.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            granularity: None,
            truncate_blocks: false,
            ..Self::yearly()
        }
    }

    /// Sets the cross-block merge policy.
    #[must_use]
    pub const fn with_merge(mut self, merge: DuplicatePolicy) -> Self {
        self.merge = merge;
        self
    }

    /// Enables bisection of oversized windows.
    #[must_use]
    pub const fn with_bisect(mut self) -> Self {
        self.bisect = true;
        self
    }

    /// Enables document-offset paging.
    #[must_use]
    pub const fn with_offset(mut self, paging: OffsetPaging) -> Self {
        self.offset = Some(paging);
        self
    }

    /// Keeps every row regardless of block or request boundaries.
    #[must_use]
    pub const fn untruncated(mut self) -> Self {
        self.truncate_blocks = false;
        self.truncate = false;
        self
    }
}

/// Runs a [`Source`] over an interval according to an [`EndpointPolicy`].
///
/// Blocks, bisection halves and offset pages are fetched one at a time, in
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline {
    policy: EndpointPolicy,
    limits: PaginationLimits,
}

impl Pipeline {
    /// Creates a pipeline with default pagination limits.
    #[must_use]
    pub fn new(policy: EndpointPolicy) -> Self {
        Self {
            policy,
            limits: PaginationLimits::default(),
        }
    }

    /// Overrides the bisection limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: PaginationLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the endpoint policy.
    #[must_use]
    pub const fn policy(&self) -> &EndpointPolicy {
        &self.policy
    }

    /// Fetches `interval` block by block and stitches the results, expressed in `tz`.
    ///
    /// # Errors
    ///
    /// Returns [`EntsoeError::NoData`] if every block is empty, or the first
    /// error that is not absorbed by bisection or paging.
    pub async fn run(&self, source: &dyn Source, interval: Interval, tz: &Tz) -> Result<Frame> {
        let blocks = match self.policy.granularity {
            Some(granularity) => interval.split(granularity),
            None => vec![interval],
        };

        let mut parts = Vec::with_capacity(blocks.len());
        for (index, block) in blocks.iter().enumerate() {
            match self.fetch_block(source, *block).await {
                Ok(mut frame) => {
                    if self.policy.truncate_blocks {
                        truncate_block(&mut frame, block, index == 0);
                    }
                    tracing::debug!(%block, rows = frame.len(), "fetched block");
                    parts.push(frame);
                }
                Err(EntsoeError::NoData) => {
                    tracing::debug!(%block, "no data for block");
                }
                Err(e) => return Err(e),
            }
        }

        if parts.is_empty() {
            return Err(EntsoeError::NoData);
        }

        let frame = self.policy.merge.apply(Frame::concat(parts));
        normalize(
            frame,
            tz,
            interval.start(),
            interval.end(),
            self.policy.truncate,
        )
    }

    async fn fetch_block(&self, source: &dyn Source, block: Interval) -> Result<Frame> {
        let fetch = move |window| self.fetch_window(source, window);
        if self.policy.bisect {
            resolve(&fetch, block, self.limits).await
        } else {
            fetch(block).await
        }
    }

    async fn fetch_window(&self, source: &dyn Source, window: Interval) -> Result<Frame> {
        match self.policy.offset {
            Some(paging) => paginate(|offset| source.fetch(window, Some(offset)), paging).await,
            None => source.fetch(window, None).await,
        }
    }
}

/// Drops rows a neighbouring block also returns.
///
/// The first block keeps `ts <= end`; later blocks keep `start < ts <= end`.
fn truncate_block(frame: &mut Frame, block: &Interval, first: bool) {
    let (start, end) = (block.start(), block.end());
    frame.retain(|row| row.timestamp <= end && (first || row.timestamp > start));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeDelta, TimeZone};
    use chrono_tz::{Europe::Brussels, UTC};
    use entsoe_types::{Row, Timestamp};
    use std::sync::Mutex;

    /// Hourly source that, like the provider, also returns the point at the window end.
    #[derive(Default)]
    struct HourlySource {
        windows: Mutex<Vec<Interval>>,
        empty_before: Option<Timestamp>,
    }

    #[async_trait]
    impl Source for HourlySource {
        async fn fetch(&self, window: Interval, _offset: Option<u32>) -> Result<Frame> {
            self.windows.lock().unwrap().push(window);
            if self.empty_before.is_some_and(|t| window.end() <= t) {
                return Err(EntsoeError::NoData);
            }
            let mut frame = Frame::new();
            let mut t = window.start().with_timezone(&UTC);
            while t <= window.end() {
                frame.push(Row::new(t).with("price", 1.0));
                t += TimeDelta::hours(1);
            }
            Ok(frame)
        }
    }

    fn brussels(y: i32, m: u32, d: u32, h: u32) -> Timestamp {
        Brussels.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_day_of_hourly_prices() {
        let source = HourlySource::default();
        let interval = Interval::new(brussels(2023, 1, 1, 0), brussels(2023, 1, 2, 0)).unwrap();
        let pipeline = Pipeline::new(EndpointPolicy::yearly());

        let frame = pipeline.run(&source, interval, &Brussels).await.unwrap();

        // 25 rows: both ends are kept.
        assert_eq!(frame.len(), 25);
        assert_eq!(frame.timestamps()[0], brussels(2023, 1, 1, 0));
        assert_eq!(frame.timestamps()[24], brussels(2023, 1, 2, 0));
        assert!(!frame.has_duplicates());
        assert_eq!(source.windows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_year_boundary_truncation_matches_single_request() {
        let interval =
            Interval::new(brussels(2022, 12, 31, 12), brussels(2023, 1, 1, 12)).unwrap();

        let split = HourlySource::default();
        let stitched = Pipeline::new(EndpointPolicy::yearly())
            .run(&split, interval, &Brussels)
            .await
            .unwrap();
        assert_eq!(split.windows.lock().unwrap().len(), 2);

        let whole = HourlySource::default();
        let single = Pipeline::new(EndpointPolicy::single())
            .run(&whole, interval, &Brussels)
            .await
            .unwrap();

        assert_eq!(stitched, single);
        assert_eq!(stitched.len(), 25);
    }

    #[tokio::test]
    async fn test_all_blocks_empty_is_no_data() {
        let source = HourlySource {
            empty_before: Some(brussels(2030, 1, 1, 0)),
            ..HourlySource::default()
        };
        let interval = Interval::new(brussels(2022, 6, 1, 0), brussels(2023, 6, 1, 0)).unwrap();

        let result = Pipeline::new(EndpointPolicy::yearly())
            .run(&source, interval, &Brussels)
            .await;
        assert!(matches!(result, Err(EntsoeError::NoData)));
        assert_eq!(source.windows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_block_is_skipped() {
        let source = HourlySource {
            empty_before: Some(brussels(2023, 1, 1, 0)),
            ..HourlySource::default()
        };
        let interval =
            Interval::new(brussels(2022, 12, 31, 12), brussels(2023, 1, 1, 6)).unwrap();

        let frame = Pipeline::new(EndpointPolicy::yearly())
            .run(&source, interval, &Brussels)
            .await
            .unwrap();
        // Second block only: (00:00, 06:00]
        assert_eq!(frame.len(), 6);
        assert_eq!(frame.timestamps()[0], brussels(2023, 1, 1, 1));
    }

    /// Hourly source returning the half-open window `[start, end)`.
    struct HalfOpenSource;

    #[async_trait]
    impl Source for HalfOpenSource {
        async fn fetch(&self, window: Interval, _offset: Option<u32>) -> Result<Frame> {
            let mut frame = Frame::new();
            let mut t = window.start().with_timezone(&UTC);
            while t < window.end() {
                frame.push(Row::new(t).with("capacity", 1.0));
                t += TimeDelta::hours(1);
            }
            Ok(frame)
        }
    }

    #[tokio::test]
    async fn test_daily_blocks_keep_every_midnight() {
        let interval = Interval::new(brussels(2023, 5, 1, 0), brussels(2023, 5, 4, 0)).unwrap();

        let frame = Pipeline::new(EndpointPolicy::daily())
            .run(&HalfOpenSource, interval, &Brussels)
            .await
            .unwrap();

        assert_eq!(frame.len(), 72);
        let stamps = frame.timestamps();
        assert!(stamps.contains(&brussels(2023, 5, 2, 0)));
        assert!(stamps.contains(&brussels(2023, 5, 3, 0)));
        assert!(!frame.has_duplicates());
    }

    #[tokio::test]
    async fn test_daily_blocks_merge_shared_midnight() {
        let source = HourlySource::default();
        let interval = Interval::new(brussels(2023, 5, 1, 0), brussels(2023, 5, 3, 0)).unwrap();

        let frame = Pipeline::new(EndpointPolicy::daily())
            .run(&source, interval, &Brussels)
            .await
            .unwrap();

        assert_eq!(source.windows.lock().unwrap().len(), 2);
        assert_eq!(frame.len(), 49);
        assert!(!frame.has_duplicates());
    }

    /// Offset-paged source that refuses windows longer than a day on its second page.
    #[derive(Default)]
    struct PagedSource {
        calls: Mutex<Vec<(Interval, Option<u32>)>>,
    }

    #[async_trait]
    impl Source for PagedSource {
        async fn fetch(&self, window: Interval, offset: Option<u32>) -> Result<Frame> {
            self.calls.lock().unwrap().push((window, offset));
            let hours = window.duration().num_hours();
            match offset {
                Some(0) => {}
                Some(_) if hours > 24 => {
                    return Err(EntsoeError::PaginationRequired {
                        requested: Some(300),
                        allowed: Some(200),
                    });
                }
                _ => return Err(EntsoeError::NoData),
            }
            let mut frame = Frame::new();
            let mut t = window.start().with_timezone(&UTC);
            while t < window.end() {
                frame.push(Row::new(t).with("span", hours as f64));
                t += TimeDelta::hours(1);
            }
            Ok(frame)
        }
    }

    #[tokio::test]
    async fn test_late_page_refusal_bisects_window() {
        let source = PagedSource::default();
        let interval = Interval::new(brussels(2023, 5, 1, 0), brussels(2023, 5, 3, 0)).unwrap();
        let policy = EndpointPolicy::yearly()
            .with_bisect()
            .with_offset(OffsetPaging::new(200, DuplicatePolicy::KeepAll));

        let frame = Pipeline::new(policy)
            .run(&source, interval, &Brussels)
            .await
            .unwrap();

        let calls: Vec<(i64, Option<u32>)> = source
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(window, offset)| (window.duration().num_hours(), *offset))
            .collect();
        assert_eq!(
            calls,
            vec![
                (48, Some(0)),
                (48, Some(200)),
                (24, Some(0)),
                (24, Some(200)),
                (24, Some(0)),
                (24, Some(200)),
            ]
        );

        // Pages of the refused window are discarded, only the halves remain.
        assert_eq!(frame.len(), 48);
        assert!(frame.numbers("span").iter().all(|(_, v)| *v == 24.0));
        assert!(!frame.has_duplicates());
    }

    /// Reports one outage at a fixed instant, valued by the block's year.
    struct OutageSource {
        at: Timestamp,
    }

    #[async_trait]
    impl Source for OutageSource {
        async fn fetch(&self, window: Interval, offset: Option<u32>) -> Result<Frame> {
            if offset != Some(0) {
                return Err(EntsoeError::NoData);
            }
            let year = window.start().year();
            Ok(Frame::from_rows(vec![
                Row::new(self.at).with("version", f64::from(year)),
            ]))
        }
    }

    #[tokio::test]
    async fn test_keep_all_across_year_blocks() {
        let at = brussels(2022, 12, 15, 8);
        let source = OutageSource { at };
        let interval = Interval::new(brussels(2022, 6, 1, 0), brussels(2023, 6, 1, 0)).unwrap();
        let policy = EndpointPolicy::yearly()
            .with_bisect()
            .with_offset(OffsetPaging::new(200, DuplicatePolicy::KeepAll))
            .with_merge(DuplicatePolicy::KeepAll)
            .untruncated();

        let frame = Pipeline::new(policy)
            .run(&source, interval, &Brussels)
            .await
            .unwrap();

        assert_eq!(frame.numbers("version"), vec![(at, 2022.0), (at, 2023.0)]);
    }

    #[tokio::test]
    async fn test_timezone_round_trip() {
        let source = HourlySource::default();
        let start = UTC.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        let end = UTC.with_ymd_and_hms(2023, 6, 1, 3, 0, 0).unwrap();
        let interval = Interval::new(start, end).unwrap();

        let frame = Pipeline::new(EndpointPolicy::yearly())
            .run(&source, interval, &Brussels)
            .await
            .unwrap();

        for (row, hour) in frame.iter().zip(0..) {
            assert_eq!(row.timestamp.timezone(), Brussels);
            assert_eq!(row.timestamp.with_timezone(&UTC), start + TimeDelta::hours(hour));
        }
        assert_eq!(frame.len(), 4);
    }
}
