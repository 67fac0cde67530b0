//! HTTP 处理器模块

pub mod auth;
pub mod extract;
pub mod harbor;
pub mod health;
pub mod operator;
pub mod permission;
pub mod role;
pub mod ship;
pub mod user;
