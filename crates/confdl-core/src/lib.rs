pub mod catalog;
pub mod config;
pub mod control;
pub mod downloader;
pub mod filter;
pub mod logging;
pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod storage;
pub mod tasks;
