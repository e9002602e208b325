//! [`ObjectStore`](stash_core::ObjectStore) adapters.
//!
//! - [`S3Store`]: Amazon S3 or any S3-compatible service (MinIO, R2, ...).
//! - [`LocalStore`]: a directory on disk, for development. Cannot presign.

pub mod local;
pub mod s3;

pub use local::LocalStore;
pub use s3::{S3Config, S3Store};

/// Sort a listing newest first; entries without a timestamp go last.
pub(crate) fn sort_newest_first(objects: &mut [stash_core::ObjectSummary]) {
    objects.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });
}
