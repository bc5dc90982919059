pub mod config;
pub mod docs;
pub mod error;
pub mod response;

pub mod auth;
pub mod cache;
pub mod database;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod session;
pub mod storage;
