//! Active account resolution and account list mutations.

mod resolver;

pub use resolver::ActiveAccountResolver;
