pub mod config;
pub mod controller;
pub mod message;
pub mod session;
pub mod stream;
pub mod title;
pub mod turn;
