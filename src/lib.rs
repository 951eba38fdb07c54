pub mod api;
pub mod audit;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod graphql;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod naming;
pub mod notify;
pub mod services;
pub mod storage;
pub mod tenancy;
pub mod types;
pub mod validation;
pub mod versioning;
