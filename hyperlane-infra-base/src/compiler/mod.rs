//! Compiles the declarative agent policy of an environment into the runtime
//! config each agent consumes.

pub use builder::*;
pub use gas::*;
pub use keys::*;
pub use output::*;

mod builder;
mod gas;
mod keys;
mod output;

#[cfg(test)]
mod tests;
