//! # Controllers Module
//!
//! The interactive loop that connects the line editor to the executor.

pub mod app_controller;

pub use app_controller::AppController;
