pub mod experience_service;
pub mod feed_service;
pub mod friendship_service;
pub mod location_classifier;
pub mod stats;
