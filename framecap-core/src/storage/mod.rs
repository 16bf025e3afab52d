pub mod checksum;
pub mod metadata;
pub mod raw_file;
