pub mod service;

pub use service::{ExpiredFileReaper, ReapSummary};
