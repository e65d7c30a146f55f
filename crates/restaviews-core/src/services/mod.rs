//! Shared service handles used by the engines and the CLI.

mod store;

pub use store::StoreService;
