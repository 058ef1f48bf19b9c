pub mod comment;
pub mod community;
pub mod community_member;
pub mod location_member;
pub mod meetup;
pub mod meetup_location;
pub mod meetup_request;
pub mod membership_request;
pub mod object_permission;
pub mod role_assignment;
pub mod rsvp;
pub mod support_request;
pub mod user;
