mod gcloud;

pub use gcloud::*;
