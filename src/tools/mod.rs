mod ffmpeg_decoder;
mod ffprobe_info;
mod frame_grabber;
mod frame_saver;
mod metadata_writer;
mod path_validator;
mod video_scanner;

pub use ffmpeg_decoder::{FfmpegDecoder, build_decode_args, scaled_dimensions};
pub use ffprobe_info::{VideoInfo, get_video_info};
pub use frame_grabber::grab_frame;
pub use frame_saver::{ExportFormat, save_frame, thumbnail_file_name};
pub use metadata_writer::{ThumbnailMetadata, format_timestamp, write_metadata};
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_video_file};
pub use video_scanner::{VideoFileInfo, scan_video_files};
