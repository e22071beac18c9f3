pub mod chat;
pub mod directory_route;
pub mod health_route;
pub mod history_route;
pub mod models_route;
pub mod suggestions_route;
