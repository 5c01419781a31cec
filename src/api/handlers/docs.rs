//! OpenAPI document endpoint.

use axum::Json;
use serde_json::{json, Value};

fn session_op(summary: &str) -> Value {
    json!({
        "get": {
            "summary": summary,
            "parameters": [{
                "name": "sessionId",
                "in": "path",
                "required": true,
                "schema": { "type": "string", "pattern": "^[\\w-]+$" }
            }],
            "responses": { "200": { "description": "Enveloped JSON response" } }
        }
    })
}

fn command_op(summary: &str) -> Value {
    json!({
        "post": {
            "summary": summary,
            "parameters": [{
                "name": "sessionId",
                "in": "path",
                "required": true,
                "schema": { "type": "string", "pattern": "^[\\w-]+$" }
            }],
            "requestBody": { "content": { "application/json": { "schema": { "type": "object" } } } },
            "responses": { "200": { "description": "Enveloped JSON response" } }
        }
    })
}

/// GET /api-docs
///
/// The whole document is one literal; keep it buildable (the crate raises
/// its recursion limit for it).
pub async fn api_docs() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.0",
        "info": {
            "title": "wagate",
            "description": "Multi-tenant HTTP gateway for WhatsApp Web automation sessions",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "components": {
            "securitySchemes": {
                "apiKey": { "type": "apiKey", "in": "header", "name": "x-api-key" },
                "bearer": { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }
            }
        },
        "paths": {
            "/ping": { "get": { "summary": "Liveness check", "responses": { "200": { "description": "pong" } } } },
            "/auth/register": { "post": { "summary": "Register an account" } },
            "/auth/login": { "post": { "summary": "Log in and receive a bearer token" } },
            "/session/start/{sessionId}": session_op("Start a session"),
            "/session/status/{sessionId}": session_op("Session status"),
            "/session/qr/{sessionId}": session_op("Pairing QR payload"),
            "/session/qr/{sessionId}/image": session_op("Pairing QR as PNG"),
            "/session/restart/{sessionId}": session_op("Restart a session"),
            "/session/terminate/{sessionId}": session_op("Terminate a session"),
            "/session/terminateInactive": { "get": { "summary": "Terminate idle sessions" } },
            "/session/terminateAll": { "get": { "summary": "Terminate every session" } },
            "/client/sendMessage/{sessionId}": command_op("Send a message"),
            "/client/sendMessageAll/{sessionId}": { "get": { "summary": "Send a batch of messages" } },
            "/client/getClassInfo/{sessionId}": session_op("Client info"),
            "/client/getChats/{sessionId}": session_op("List chats"),
            "/client/getChatById/{sessionId}": command_op("Fetch one chat"),
            "/client/getContacts/{sessionId}": session_op("List contacts"),
            "/client/getContactById/{sessionId}": command_op("Fetch one contact"),
            "/client/getNumberId/{sessionId}": command_op("Resolve a number to an id"),
            "/client/isRegisteredUser/{sessionId}": command_op("Check number registration"),
            "/client/getState/{sessionId}": session_op("Engine connection state"),
            "/client/setStatus/{sessionId}": command_op("Set profile status"),
            "/client/createGroup/{sessionId}": command_op("Create a group"),
            "/chat/getClassInfo/{sessionId}": command_op("Chat info"),
            "/chat/clearMessages/{sessionId}": command_op("Clear chat messages"),
            "/chat/delete/{sessionId}": command_op("Delete a chat"),
            "/chat/fetchMessages/{sessionId}": command_op("Fetch chat messages"),
            "/chat/getContact/{sessionId}": command_op("Chat contact"),
            "/groupChat/getClassInfo/{sessionId}": command_op("Group info"),
            "/groupChat/addParticipants/{sessionId}": command_op("Add participants"),
            "/groupChat/removeParticipants/{sessionId}": command_op("Remove participants"),
            "/groupChat/getInviteCode/{sessionId}": command_op("Invite code"),
            "/groupChat/leave/{sessionId}": command_op("Leave group"),
            "/groupChat/setSubject/{sessionId}": command_op("Set subject"),
            "/groupChat/setDescription/{sessionId}": command_op("Set description"),
            "/groupChat/setInfoAdminsOnly/{sessionId}": command_op("Restrict info edits"),
            "/groupChat/setMessagesAdminsOnly/{sessionId}": command_op("Restrict messages"),
            "/groupChat/setPicture/{sessionId}": command_op("Set group picture"),
            "/groupChat/deletePicture/{sessionId}": command_op("Delete group picture"),
            "/message/getClassInfo/{sessionId}": command_op("Message info"),
            "/message/delete/{sessionId}": command_op("Delete a message"),
            "/message/downloadMedia/{sessionId}": command_op("Download message media"),
            "/message/getInfo/{sessionId}": command_op("Delivery info"),
            "/message/reply/{sessionId}": command_op("Reply to a message"),
            "/contact/getClassInfo/{sessionId}": command_op("Contact info"),
            "/contact/block/{sessionId}": command_op("Block contact"),
            "/contact/unblock/{sessionId}": command_op("Unblock contact"),
            "/contact/getAbout/{sessionId}": command_op("Contact about text"),
            "/contact/getChat/{sessionId}": command_op("Contact chat"),
            "/contact/getFormattedNumber/{sessionId}": command_op("Formatted number"),
            "/contact/getCountryCode/{sessionId}": command_op("Country code"),
            "/contact/getProfilePicUrl/{sessionId}": command_op("Profile picture URL"),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_lists_every_route() {
        let Json(doc) = api_docs().await;
        assert_eq!(doc["openapi"], "3.0.0");
        let paths = doc["paths"].as_object().unwrap();
        assert!(paths.len() >= 50, "only {} paths documented", paths.len());
        assert!(paths.contains_key("/session/start/{sessionId}"));
        assert!(paths.contains_key("/contact/getProfilePicUrl/{sessionId}"));
    }
}
