//! Personalized fashion recommendation service.
//!
//! Turns a user's styling profile into outfit prompts and renders them into
//! hosted images. Each image is reverse-searched for purchasable products,
//! and the formatted results are served as cached pages.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
