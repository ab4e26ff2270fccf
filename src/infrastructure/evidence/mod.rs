//! Evidence source implementations

mod in_memory;
mod tavily;

pub use in_memory::InMemoryIndex;
pub use tavily::TavilySearch;
