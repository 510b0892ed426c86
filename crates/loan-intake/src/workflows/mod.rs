pub mod application;
pub mod calculator;
pub mod officers;
