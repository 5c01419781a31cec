//! API route definitions.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers::{auth, chat, client, contact, docs, group_chat, health, message, session};
use super::middleware::require_api_key;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let mut public = Router::new()
        .route("/ping", get(health::ping))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));
    if state.enable_swagger {
        public = public.route("/api-docs", get(docs::api_docs));
    }

    let session_routes = Router::new()
        .route("/session/start/{sessionId}", get(session::start))
        .route("/session/status/{sessionId}", get(session::status))
        .route("/session/qr/{sessionId}", get(session::qr_code))
        .route("/session/qr/{sessionId}/image", get(session::qr_image))
        .route("/session/restart/{sessionId}", get(session::restart))
        .route("/session/terminate/{sessionId}", get(session::terminate))
        .route("/session/terminateInactive", get(session::terminate_inactive))
        .route("/session/terminateAll", get(session::terminate_all));

    let client_routes = Router::new()
        .route("/client/sendMessage/{sessionId}", post(client::send_message))
        .route(
            "/client/sendMessageAll/{sessionId}",
            get(client::send_message_all),
        )
        .route(
            "/client/getClassInfo/{sessionId}",
            get(client::get_class_info),
        )
        .route("/client/getChats/{sessionId}", get(client::get_chats))
        .route(
            "/client/getChatById/{sessionId}",
            post(client::get_chat_by_id),
        )
        .route("/client/getContacts/{sessionId}", get(client::get_contacts))
        .route(
            "/client/getContactById/{sessionId}",
            post(client::get_contact_by_id),
        )
        .route(
            "/client/getNumberId/{sessionId}",
            post(client::get_number_id),
        )
        .route(
            "/client/isRegisteredUser/{sessionId}",
            post(client::is_registered_user),
        )
        .route("/client/getState/{sessionId}", get(client::get_state))
        .route("/client/setStatus/{sessionId}", post(client::set_status))
        .route("/client/createGroup/{sessionId}", post(client::create_group));

    let chat_routes = Router::new()
        .route("/chat/getClassInfo/{sessionId}", post(chat::get_class_info))
        .route("/chat/clearMessages/{sessionId}", post(chat::clear_messages))
        .route("/chat/delete/{sessionId}", post(chat::delete_chat))
        .route("/chat/fetchMessages/{sessionId}", post(chat::fetch_messages))
        .route("/chat/getContact/{sessionId}", post(chat::get_contact));

    let group_chat_routes = Router::new()
        .route(
            "/groupChat/getClassInfo/{sessionId}",
            post(group_chat::get_class_info),
        )
        .route(
            "/groupChat/addParticipants/{sessionId}",
            post(group_chat::add_participants),
        )
        .route(
            "/groupChat/removeParticipants/{sessionId}",
            post(group_chat::remove_participants),
        )
        .route(
            "/groupChat/getInviteCode/{sessionId}",
            post(group_chat::get_invite_code),
        )
        .route("/groupChat/leave/{sessionId}", post(group_chat::leave))
        .route(
            "/groupChat/setSubject/{sessionId}",
            post(group_chat::set_subject),
        )
        .route(
            "/groupChat/setDescription/{sessionId}",
            post(group_chat::set_description),
        )
        .route(
            "/groupChat/setInfoAdminsOnly/{sessionId}",
            post(group_chat::set_info_admins_only),
        )
        .route(
            "/groupChat/setMessagesAdminsOnly/{sessionId}",
            post(group_chat::set_messages_admins_only),
        )
        .route(
            "/groupChat/setPicture/{sessionId}",
            post(group_chat::set_picture),
        )
        .route(
            "/groupChat/deletePicture/{sessionId}",
            post(group_chat::delete_picture),
        );

    let message_routes = Router::new()
        .route(
            "/message/getClassInfo/{sessionId}",
            post(message::get_class_info),
        )
        .route("/message/delete/{sessionId}", post(message::delete_message))
        .route(
            "/message/downloadMedia/{sessionId}",
            post(message::download_media),
        )
        .route("/message/getInfo/{sessionId}", post(message::get_info))
        .route("/message/reply/{sessionId}", post(message::reply));

    let contact_routes = Router::new()
        .route(
            "/contact/getClassInfo/{sessionId}",
            post(contact::get_class_info),
        )
        .route("/contact/block/{sessionId}", post(contact::block))
        .route("/contact/unblock/{sessionId}", post(contact::unblock))
        .route("/contact/getAbout/{sessionId}", post(contact::get_about))
        .route("/contact/getChat/{sessionId}", post(contact::get_chat))
        .route(
            "/contact/getFormattedNumber/{sessionId}",
            post(contact::get_formatted_number),
        )
        .route(
            "/contact/getCountryCode/{sessionId}",
            post(contact::get_country_code),
        )
        .route(
            "/contact/getProfilePicUrl/{sessionId}",
            post(contact::get_profile_pic_url),
        );

    let mut protected = session_routes
        .merge(client_routes)
        .merge(chat_routes)
        .merge(group_chat_routes)
        .merge(message_routes)
        .merge(contact_routes);
    if state.enable_local_callback {
        protected = protected.route(
            "/localCallbackExample",
            post(health::local_callback_example),
        );
    }
    let protected =
        protected.layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
