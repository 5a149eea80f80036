pub mod actor;
pub mod config;
pub mod db;
pub mod error_convert;
pub mod health;
pub mod openapi;
pub mod rest;
pub mod telemetry;

// Integrations
pub mod sms;
pub mod storage;
pub mod typst;

// Domain
pub mod repo;
pub mod services;
