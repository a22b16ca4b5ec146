//! Chat-scoped state store.
//!
//! The trait defines the lookup contract; `InMemoryStateStore` is the
//! bundled backend.

mod memory;
mod traits;

pub use memory::InMemoryStateStore;
pub use traits::StateStore;
