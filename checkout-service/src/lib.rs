pub mod app;
pub mod catalog;
pub mod db;
pub mod order_handlers;
pub mod product_handlers;

pub use app::{build_router, AppState};
