//! Upload Routes
//!
//! `POST /api/upload` stores one image, `GET /uploads/{filename}` serves it back.

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/api/upload",
            post(handler::upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/uploads/{filename}", get(handler::serve_uploaded_file))
}
