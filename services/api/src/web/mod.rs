pub mod auth;
pub mod cookie;
pub mod middleware;
pub mod pages;
pub mod rest;
pub mod router;
pub mod search;
pub mod state;

// Re-export what the binaries need to build the server.
pub use router::router;
pub use state::AppState;
