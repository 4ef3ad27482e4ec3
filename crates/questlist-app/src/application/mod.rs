pub mod dtos;
pub mod handlers;
pub mod queries;
pub mod services;
