pub mod cache;
pub mod index;
pub mod ingest;
pub mod recommendation;
pub mod store;
