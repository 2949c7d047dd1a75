mod local_storage;
mod s3_storage;

pub use local_storage::*;
pub use s3_storage::*;
