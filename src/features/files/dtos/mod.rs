mod file_dto;

pub use file_dto::{
    CreateFileDto, FileResponseDto, FileStateResponseDto, ListFilesQuery, UploadUrlResponseDto,
};
