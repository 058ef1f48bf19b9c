//! User-facing result messages.

pub const MEETUP_CREATED: &str = "Meetup successfully created!";
pub const MEETUP_REQUEST_SUBMITTED: &str = "Your request for a new meetup is successfully submitted. Please wait until someone reviews your request.";
pub const MEETUP_REQUEST_REJECTED: &str = "Meetup request successfully rejected!";
pub const SUPPORT_REQUEST_SUBMITTED: &str = "Your support request is successfully submitted. Please wait until someone reviews your request.";
pub const SUPPORT_REQUEST_APPROVED: &str = "Support request successfully approved!";
pub const SUPPORT_REQUEST_REJECTED: &str = "Support request successfully rejected!";
pub const ALREADY_VOLUNTEERED: &str = "You have already volunteered for this meetup. Please wait until someone reviews your request.";

pub fn slug_already_exists(slug: &str) -> String {
    format!("Slug {slug} already exists, please choose a different slug.")
}

pub fn meetup_already_requested(slug: &str) -> String {
    format!("A meetup with slug {slug} has already been requested. Please wait until someone reviews the request.")
}

pub fn join_requested(what: &str) -> String {
    format!("Your request to join {what} has been sent. In a short while someone will review your request.")
}

pub fn join_already_requested(what: &str) -> String {
    format!("You have already requested to join {what}. Please wait until someone reviews your request.")
}

pub fn already_member(what: &str) -> String {
    format!("You are already a member of {what}.")
}

pub fn user_already_member(username: &str, what: &str) -> String {
    format!("{username} is already a member of {what}.")
}

pub fn not_a_member(username: &str, what: &str) -> String {
    format!("{username} is not a member of {what}.")
}

pub fn upgrade_requested(what: &str) -> String {
    format!("Your request to become an organizer of {what} has been sent. In a short while someone will review your request.")
}

pub fn upgrade_already_requested(what: &str) -> String {
    format!("You have already requested to become an organizer of {what}. Please wait until someone reviews your request.")
}

pub fn already_organizer(username: &str, what: &str) -> String {
    format!("{username} is already an organizer of {what}.")
}

pub fn not_organizer(username: &str, what: &str) -> String {
    format!("{username} is not an organizer of {what}.")
}

pub fn sole_organizer(username: &str, what: &str) -> String {
    format!("{username} is the only organizer of {what} and cannot be removed.")
}

pub fn member_added(username: &str, what: &str) -> String {
    format!("{username} is now a member of {what}.")
}

pub fn member_removed(username: &str, what: &str) -> String {
    format!("{username} has been removed from {what}.")
}

pub fn organizer_added(username: &str, what: &str) -> String {
    format!("{username} is now an organizer of {what}.")
}

pub fn organizer_removed(username: &str, what: &str) -> String {
    format!("{username} is no longer an organizer of {what}.")
}

pub fn request_rejected(username: &str, what: &str) -> String {
    format!("The request of {username} for {what} has been rejected.")
}
