//! HTTP API handlers for museum-guide

pub mod buildings;
pub mod health;
pub mod recognize;

pub use buildings::building_routes;
pub use health::health_routes;
pub use recognize::recognize_routes;
