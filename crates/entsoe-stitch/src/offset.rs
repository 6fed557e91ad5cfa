//! Document-offset pagination for endpoints that cap documents per response.

use std::future::Future;

use entsoe_types::{EntsoeError, Frame, Result};

use crate::DuplicatePolicy;

/// Offset sequence and merge policy for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPaging {
    /// Documents per page.
    pub step: u32,
    /// Highest offset ever requested.
    pub max_offset: u32,
    /// How duplicate timestamps across pages are merged.
    pub policy: DuplicatePolicy,
}

impl OffsetPaging {
    /// Provider cap on the offset parameter.
    pub const MAX_OFFSET: u32 = 4800;

    /// Creates paging with the given step and the provider offset cap.
    #[must_use]
    pub const fn new(step: u32, policy: DuplicatePolicy) -> Self {
        Self {
            step,
            max_offset: Self::MAX_OFFSET,
            policy,
        }
    }

    /// Returns the offsets to request, in order.
    pub fn offsets(&self) -> impl Iterator<Item = u32> {
        (0..=self.max_offset).step_by(self.step.max(1) as usize)
    }
}

/// Requests consecutive offset pages until the provider reports no data.
///
/// # Errors
///
/// Returns [`EntsoeError::NoData`] if the very first page is empty, or the first
/// other error any page returns.
pub async fn paginate<F, Fut>(fetch: F, paging: OffsetPaging) -> Result<Frame>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Frame>>,
{
    let mut pages = Vec::new();
    for offset in paging.offsets() {
        match fetch(offset).await {
            Ok(frame) => {
                tracing::debug!(offset, rows = frame.len(), "fetched page");
                pages.push(frame);
            }
            Err(EntsoeError::NoData) => break,
            Err(e) => return Err(e),
        }
    }

    if pages.is_empty() {
        return Err(EntsoeError::NoData);
    }
    Ok(paging.policy.apply(Frame::concat(pages)))
}
