pub mod file;
pub mod http;
pub mod util;

pub use file::FileStockProvider;
pub use http::HttpStockProvider;
