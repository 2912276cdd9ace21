//! Lowest-common-ancestor assignment of taxon database records.
//!
//! The taxonomy is loaded once from NCBI `nodes.dmp`/`names.dmp` dumps and
//! shared read-only between workers. The record range of the database is
//! split into one contiguous job per worker; each worker resolves its records
//! and writes its own TSV file.

pub mod classify;
pub mod config;
pub mod decompose;
pub mod errors;
pub mod gz_stream;
pub mod kv_store;
pub mod mmap_file;
pub mod taxonomy;
pub mod utilities;
pub mod workers;

pub use config::{run, Config, Options};
pub use errors::Error;
pub use taxonomy::{TaxId, Taxonomy, TaxonomyNode};
