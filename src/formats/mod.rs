//! Encoders for the files the extractor writes.

pub mod png;
pub mod redux_map;
pub mod tga;
pub mod wav;
