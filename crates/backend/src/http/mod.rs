mod client;
mod mapping;
mod wire;

pub use client::HttpBackend;
