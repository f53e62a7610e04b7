pub mod actions;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pager;
pub mod seed;
pub mod store;
pub mod types;

pub use app::{app, AppState};
pub use error::{ErrCode, Error};
