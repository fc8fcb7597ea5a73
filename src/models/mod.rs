//! 数据模型模块
//! 请求/响应 DTO

pub mod auth;
pub mod user;
