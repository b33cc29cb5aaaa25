//! CDR Ingest Database Layer
//!
//! PostgreSQL storage for cleaned CDR records:
//!
//! - Connection pool management with sqlx
//! - `PgCdrRepository`, a [`CdrSink`](cdr_core::traits::CdrSink) that skips
//!   records already stored

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

pub use cdr_core::{AppError, AppResult};
pub use sqlx::PgPool;
