//! fetch
//!
//! Remote asset acquisition: URL building, the transport seam, and the
//! batched concurrent pipeline.
//!
//! # Architecture
//!
//! - [`source`] - pure (entity, key, version) to URL mapping
//! - [`transport`] - the request-by-URL trait with HTTP and mock impls
//! - [`pipeline`] - batching, pacing, per-item failure containment, stats
//!
//! Retry with backoff lives in [`crate::engine::runner`], not here: the
//! pipeline runs one whole attempt and reports its failed subset.

pub mod pipeline;
pub mod source;
pub mod transport;

pub use pipeline::{fetch_all, FetchOutcome, FetchStats};
pub use source::{FetchedContent, SourceReference, SourceUrlBuilder};
pub use transport::{ContentTransport, HttpTransport, MockTransport, TransportError};
