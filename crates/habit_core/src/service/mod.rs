//! Core use-case services built on top of repositories.

pub mod tracking_service;
