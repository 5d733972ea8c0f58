//! Chanflow pipeline protocol
//!
//! Wire payloads exchanged over the broker queues:
//!
//! ```text
//! Dispatcher --[tasks_queue: Task]--> Worker --[results_queue: ScrapeResult]--> Ingestor
//! ```
//!
//! Payloads are JSON documents. Decoding is the validation boundary: anything
//! that does not match a known shape is rejected with a [`ProtocolError`]
//! instead of flowing further into the pipeline.

pub mod defaults;
pub mod error;
pub mod proxy;
pub mod types;

pub use error::{ProtocolError, Result};
pub use proxy::{ProxyConfig, ProxyScheme};
pub use types::{
    ChannelStatus, CompletionMarker, Credentials, HistoryTask, MessageRecord, ScrapeResult, Task,
};
