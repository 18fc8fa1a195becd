// ====================================================================================
// src/lib.rs - 直播间推送流客户端
// ====================================================================================
pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod room;
pub mod sink;
