//! File storage adapters for uploaded image bytes.

mod upload_dir;

pub use upload_dir::UploadDirectory;
