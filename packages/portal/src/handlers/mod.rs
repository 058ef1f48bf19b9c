pub mod auth;
pub mod comment;
pub mod community;
pub mod location;
pub mod meetup;
pub mod rsvp;
pub mod support;

use axum::{Json, http::StatusCode};

use crate::workflow::Outcome;

/// 201 when the call created something, 200 for the other business results.
fn created_or_ok<T>(outcome: Outcome<T>) -> (StatusCode, Json<Outcome<T>>) {
    let status = if outcome.is_ok() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(outcome))
}
