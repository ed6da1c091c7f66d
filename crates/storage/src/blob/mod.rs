//! Tenant-partitioned blob storage.
//!
//! - [`BlobKey`] - write-once object key (random token + name suffix)
//! - [`BlobStore`] - capability trait: save / read / delete
//! - [`LocalBlobStore`] - local filesystem backend, `<root>/<tenant>/<key>`

mod key;
mod local;
mod store;

pub use key::{BlobKey, MAX_BLOB_KEY_LEN};
pub use local::LocalBlobStore;
pub use store::BlobStore;
