pub mod binary_utils;
pub mod containers;
pub mod error;
pub mod formats;
pub mod graphics;
pub mod jaguar_extractor;
pub mod mac_extractor;
pub mod output;
pub mod pc_extractor;
pub mod profile;
pub mod progress;
pub mod runner;
pub mod title;
pub mod version;
