pub mod api;
pub mod config;
pub mod humanize;
pub mod jar;
pub mod observability;
pub mod storage;
