//! 认证网关库
//! 凭证认证、加密访问令牌签发与校验，以及对外的 HTTP 服务

pub mod auth;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
