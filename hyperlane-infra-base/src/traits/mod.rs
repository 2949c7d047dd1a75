mod checkpoint_syncer;
mod provisioner;
mod secret_store;

pub use checkpoint_syncer::*;
pub use provisioner::*;
pub use secret_store::*;
