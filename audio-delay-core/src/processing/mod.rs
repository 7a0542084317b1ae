pub mod delay_queue;
pub mod demux;
pub mod wav_format;
