pub mod app;
mod draw;
pub mod edit;
