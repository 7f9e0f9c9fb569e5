pub mod file_portrait_writer;
