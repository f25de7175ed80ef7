// Adapters layer: concrete implementations for external systems (provider http api, storage).

pub mod http;
pub mod storage;

pub use http::CensysClient;
pub use storage::LocalStorage;
