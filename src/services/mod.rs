pub mod admin;
pub mod multi_file;
pub mod single_file;

pub use admin::AdminService;
pub use multi_file::MultiFileService;
pub use single_file::SingleFileService;
