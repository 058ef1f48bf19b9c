use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, comment, community, location, meetup, rsvp, support};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/communities", community_routes())
        .nest("/locations", location_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn community_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            community::list_communities,
            community::create_community
        ))
        .routes(routes!(community::get_community))
        .routes(routes!(community::list_community_members))
        .routes(routes!(community::request_join))
        .routes(routes!(community::list_join_requests))
        .routes(routes!(community::approve_join_request))
        .routes(routes!(community::reject_join_request))
        .routes(routes!(community::grant_role))
        .routes(routes!(community::revoke_role))
}

fn location_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(location::list_locations, location::create_location))
        .routes(routes!(
            location::get_location,
            location::update_location,
            location::delete_location
        ))
        .routes(routes!(location::list_members, location::add_member))
        .routes(routes!(location::remove_member))
        .routes(routes!(location::promote_organizer))
        .routes(routes!(location::demote_organizer))
        .routes(routes!(location::request_join))
        .routes(routes!(location::request_organizer_upgrade))
        .routes(routes!(location::list_requests))
        .routes(routes!(location::approve_request))
        .routes(routes!(location::reject_request))
        .merge(meetup_routes())
}

fn meetup_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(meetup::list_meetups, meetup::create_meetup))
        .routes(routes!(
            meetup::get_meetup,
            meetup::update_meetup,
            meetup::delete_meetup
        ))
        .routes(routes!(
            meetup::list_meetup_requests,
            meetup::propose_meetup
        ))
        .routes(routes!(meetup::approve_meetup_request))
        .routes(routes!(meetup::reject_meetup_request))
        .routes(routes!(rsvp::list_rsvps, rsvp::rsvp))
        .routes(routes!(
            comment::list_meetup_comments,
            comment::add_meetup_comment
        ))
        .routes(routes!(
            comment::edit_meetup_comment,
            comment::delete_meetup_comment
        ))
        .merge(support_routes())
}

fn support_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(support::list_volunteers))
        .routes(routes!(
            support::list_support_requests,
            support::volunteer
        ))
        .routes(routes!(
            support::update_support_request,
            support::delete_support_request
        ))
        .routes(routes!(support::approve_support_request))
        .routes(routes!(support::reject_support_request))
        .routes(routes!(
            comment::list_support_request_comments,
            comment::add_support_request_comment
        ))
        .routes(routes!(
            comment::edit_support_request_comment,
            comment::delete_support_request_comment
        ))
}
