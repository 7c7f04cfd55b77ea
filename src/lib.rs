// Book Themes - Library Entry Point

pub mod constants;
pub mod error;
pub mod config;
pub mod db;
pub mod hash;
pub mod themes;
pub mod gateway;
