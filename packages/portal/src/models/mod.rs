pub mod auth;
pub mod comment;
pub mod community;
pub mod location;
pub mod meetup;
pub mod rsvp;
pub mod shared;
pub mod support;
