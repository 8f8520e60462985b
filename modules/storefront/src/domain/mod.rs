pub mod access;
pub mod cart_service;
pub mod catalog;
pub mod error;
pub mod order_service;
pub mod ports;
pub mod repo;
