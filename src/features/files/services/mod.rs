mod file_query_service;
mod file_service;

pub use file_query_service::FileQueryService;
pub use file_service::FileService;
