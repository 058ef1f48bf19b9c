mod comment;
mod location;
mod meetup;
mod meetup_request;
mod rsvp;
mod support_request;
