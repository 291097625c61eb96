pub mod adapters;
pub mod config;
pub mod error;
pub mod imaging;
pub mod web;
