//! HTTP surface: the prediction page and its JSON API

pub mod api;
pub mod form;
pub mod handlers;
pub mod page;
pub mod state;

pub use state::{AppState, ModelState};

use actix_web::web;

/// Register all routes; shared by the server and the tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(handlers::form_error_handler))
        .service(handlers::index)
        .service(handlers::predict)
        .service(
            web::scope("/api")
                .app_data(web::JsonConfig::default().error_handler(api::json_error_handler))
                .service(api::health)
                .service(api::model_info)
                .service(api::predict)
                .service(api::stats),
        );
}
