//! Party store backends.

pub mod file;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use file::FilePartyStore;
pub use memory::InMemoryPartyStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresPartyStore;
