pub mod dataset;
pub mod storage_manager;
pub mod url_list;

pub use dataset::*;
pub use storage_manager::*;
pub use url_list::*;
