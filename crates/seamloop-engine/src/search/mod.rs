//! Loop point search.
//!
//! - [`tail`]: Stage A, best loop end for a fixed begin
//! - [`offset`]: Stage B, best begin for a fixed loop length
//! - [`snap`]: local-minimum refinement against either stage's curve
//!
//! Both stages are [`Scan`] state machines so a host can interleave them with
//! other work, report progress, and cancel between chunks.

pub mod config;
pub mod curve;
pub mod offset;
pub mod snap;
pub mod tail;
pub mod task;

pub use config::{
    SearchConfig, DEFAULT_SNAP_DISTANCE, DEFAULT_SSE_THRESHOLD, DEFAULT_WINDOW_SIZE,
    DEFAULT_YIELD_INTERVAL,
};
pub use curve::{argmin, ErrorCurve, LoopCandidate};
pub use offset::{offset_search, OffsetScan, OffsetSearchResult};
pub use snap::snap_to_local_minimum;
pub use tail::{tail_search, TailScan, TailSearchResult, SATURATED_SCORE};
pub use task::{run_to_completion, CancelToken, Scan, ScanStep, SearchProgress};
