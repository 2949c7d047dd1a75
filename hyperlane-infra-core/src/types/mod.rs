pub use checkpoint::*;

mod checkpoint;
