//! Provider CDR feed
//!
//! Finds the daily files a provider drops into the input directory, reads
//! them into [`RawCdrRecord`](cdr_core::models::RawCdrRecord)s and moves
//! them out of the way once a batch has been delivered.

pub mod discovery;
pub mod reader;

pub use discovery::{archive, discover_files, file_name_for};
pub use reader::{CdrFileReader, CdrRows, Column};
