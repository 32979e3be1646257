//! In-memory doubles of the capability traits
//!
//! These mocks allow testing the services, and the HTTP layer above them,
//! without a database, an object store or a cache server.

mod mock_cache;
mod mock_file_store;
mod mock_storage;

pub use mock_cache::FailingCache;
pub use mock_file_store::{sample_record, MockFileStore};
pub use mock_storage::MockStorage;
