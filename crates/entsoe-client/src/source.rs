//! Adapter from a raw query plus decoder to a stitching [`Source`].

use async_trait::async_trait;

use entsoe_fetch::{Payload, Query, RawClient};
use entsoe_stitch::Source;
use entsoe_types::{Frame, Interval, Result};

/// Sends narrowed copies of one query and decodes each payload.
pub(crate) struct EndpointSource<'a, D> {
    client: &'a RawClient,
    query: Query,
    decode: D,
}

impl<'a, D> EndpointSource<'a, D>
where
    D: Fn(&Payload) -> Result<Frame> + Send + Sync,
{
    pub(crate) const fn new(client: &'a RawClient, query: Query, decode: D) -> Self {
        Self {
            client,
            query,
            decode,
        }
    }
}

#[async_trait]
impl<D> Source for EndpointSource<'_, D>
where
    D: Fn(&Payload) -> Result<Frame> + Send + Sync,
{
    async fn fetch(&self, window: Interval, offset: Option<u32>) -> Result<Frame> {
        let query = self.query.with_interval(window).with_offset(offset);
        let payload = self.client.request(&query).await?;
        (self.decode)(&payload)
    }
}
