//! HTTP Layer - RESTful API
//!
//! 投票与提案接口的薄适配层，业务逻辑全部在应用层 Handler 中

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{build_app, HttpServer};
pub use state::{AppState, Repositories, VotingOptions};
