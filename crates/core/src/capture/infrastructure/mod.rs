pub mod ffmpeg_camera_source;
pub mod image_file_source;
pub mod jpeg_encoder;
