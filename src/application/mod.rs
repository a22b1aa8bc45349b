// Application layer - use cases over the vitals repository
pub mod request_cache;
pub mod vitals_repository;
pub mod vitals_service;
