pub mod account;
pub mod cloudbuild;
mod http;
pub mod releases;
pub mod runner;
pub mod storage;
pub mod toolchain;
