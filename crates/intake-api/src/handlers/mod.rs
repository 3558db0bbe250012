//! HTTP request handlers for the intake API

pub mod order;
pub mod qris;
pub mod uploads;
