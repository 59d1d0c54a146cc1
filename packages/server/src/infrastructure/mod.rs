//! Infrastructure layer: wire formats and storage backends.

pub mod dto;
pub mod repository;
