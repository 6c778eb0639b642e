//! Storage implementations and the default document resolver

#[cfg(feature = "in-memory")]
pub mod in_memory;
pub mod resolver;

#[cfg(feature = "in-memory")]
pub use in_memory::InMemoryDatabase;
pub use resolver::StoreResolver;
