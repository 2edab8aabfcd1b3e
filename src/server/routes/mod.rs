//! API route handlers

pub mod drinks;
