//! Image payloads and data URIs.

mod data_uri;
mod types;

pub use data_uri::DataUri;
pub use types::{ImageAsset, ImageFormat, ImageOrigin};
