//! Web module - HTTP routes and page rendering

mod page;
mod server;

pub use server::{AppError, Server};
