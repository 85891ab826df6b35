// Jobs executed by the runner

pub mod app_bits_packer;


pub use app_bits_packer::{AppBitsPacker, PackRequest, PackagingServices};
