pub mod zip_packer;

pub use zip_packer::{member_name, pack};
