mod download;

pub use download::{download_to_temp, Downloaded};
