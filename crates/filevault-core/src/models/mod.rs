pub mod file;
pub mod search;
pub mod upload;

pub use file::{check_upload_file_name, FileRecord, NewFileRecord, RenameFileRequest, UploadResponse};
pub use search::SearchParams;
pub use upload::{Chunk, UploadSession, UploadStatus};
