pub mod viewer_context;

pub use viewer_context::{viewer_context_middleware, HasDatabase, ViewerContext};
