pub mod metadata;
pub mod staged_recorder;
