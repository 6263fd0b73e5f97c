pub mod capture_buffer;
pub mod pcm;
pub mod wav_format;
