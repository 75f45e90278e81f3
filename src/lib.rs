//! Account lookup and one-pager assembly over a partitioned JSON dataset.
//!
//! Flow: account number in, [`store::RecordStore`] finds the raw record,
//! [`resolver`] picks fields through their header aliases, [`util`] formats
//! them, [`metrics`] derives the settlement figures and
//! [`reports::ReportAssembler`] returns one [`types::ReportValue`].

pub mod chunker;
pub mod config;
pub mod errors;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod resolver;
pub mod store;
pub mod types;
pub mod util;

pub use config::AppConfig;
pub use errors::{ChunkError, ConfigError, FetchError, LookupError};
pub use loader::{DirSource, HttpSource, MemorySource, PartitionSource};
pub use reports::{FollowUpInputs, ReportAssembler};
pub use store::{Found, PartitionScheme, RecordStore};
pub use types::{RawRecord, ReportValue};
