//! Repository implementations

pub mod cdr_repo;

pub use cdr_repo::PgCdrRepository;
