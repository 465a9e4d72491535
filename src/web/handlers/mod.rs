//! HTTP request handlers organised by resource

pub mod channels;
pub mod health;
pub mod videos;
