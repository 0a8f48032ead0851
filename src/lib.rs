pub mod config;
pub mod db;
pub mod enumerate;
pub mod harvest;
pub mod pace;
pub mod storage;
