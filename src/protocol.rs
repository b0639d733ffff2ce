//! Cross-boundary message protocol between the host page and the embedded
//! overlay context.
//!
//! Every message crosses the boundary as `{"type": <u32>, "data": <payload>}`.
//! The numeric discriminants are a closed enumeration fixed at build time;
//! there is no versioning or schema negotiation. Unknown discriminants and
//! malformed payloads are ignored (forward-compatible no-op, not an error).
//!
//! Inbound traffic (embedded context -> host) is parsed into the typed
//! [`InboundMessage`] sum type so the router can match exhaustively. Outbound
//! traffic is the single `render` message assembled here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::trace;

use crate::error::{OverlayError, ResultExt};
use crate::session::OverlayKind;

/// Wire discriminants for every message kind crossing the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Host -> embedded: render the overlay content (outbound only).
    Render,
    Remove,
    Resize,
    SwitchToInlineMenu,
    FillWithCredential,
    FillSingleField,
    ItemCreated,
    ShowCreateDialog,
    ShowToast,
    SuppressMenus,
    ColorSchemeChanged,
    RedirectUrl,
    CopyText,
    ShowLargeText,
}

impl MessageKind {
    /// Parse a wire code to a kind. Unknown codes return `None`.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Render),
            1 => Some(Self::Remove),
            2 => Some(Self::Resize),
            3 => Some(Self::SwitchToInlineMenu),
            4 => Some(Self::FillWithCredential),
            5 => Some(Self::FillSingleField),
            6 => Some(Self::ItemCreated),
            7 => Some(Self::ShowCreateDialog),
            8 => Some(Self::ShowToast),
            9 => Some(Self::SuppressMenus),
            10 => Some(Self::ColorSchemeChanged),
            11 => Some(Self::RedirectUrl),
            12 => Some(Self::CopyText),
            13 => Some(Self::ShowLargeText),
            _ => None,
        }
    }

    /// Get the wire code for this kind.
    pub fn code(&self) -> u64 {
        match self {
            Self::Render => 0,
            Self::Remove => 1,
            Self::Resize => 2,
            Self::SwitchToInlineMenu => 3,
            Self::FillWithCredential => 4,
            Self::FillSingleField => 5,
            Self::ItemCreated => 6,
            Self::ShowCreateDialog => 7,
            Self::ShowToast => 8,
            Self::SuppressMenus => 9,
            Self::ColorSchemeChanged => 10,
            Self::RedirectUrl => 11,
            Self::CopyText => 12,
            Self::ShowLargeText => 13,
        }
    }
}

/// Typed inbound message, one variant per actionable wire kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Remove,
    /// New overlay size in pixels. Non-numeric wire values decay to 0.
    Resize {
        width: f64,
        height: f64,
    },
    SwitchToInlineMenu,
    /// Free-form credential object, passed through to the fill collaborator.
    FillWithCredential {
        credential: Value,
    },
    FillSingleField {
        text: String,
        append_value: bool,
    },
    ItemCreated {
        credential: Value,
        message: String,
    },
    ShowCreateDialog,
    ShowToast {
        message: String,
    },
    SuppressMenus,
    ColorSchemeChanged {
        scheme: String,
    },
    RedirectUrl {
        url: String,
    },
    CopyText {
        text: String,
    },
    ShowLargeText,
}

#[derive(Deserialize)]
struct FillSingleFieldPayload {
    text: String,
    #[serde(rename = "appendValue", default)]
    append_value: bool,
}

#[derive(Deserialize)]
struct ItemCreatedPayload {
    credential: Value,
    #[serde(default)]
    message: String,
}

impl InboundMessage {
    /// Parse a raw wire message. Returns `None` for unknown kinds, missing or
    /// malformed payloads, and for `Render` (which is outbound only).
    pub fn parse(raw: &Value) -> Option<Self> {
        let code = raw.get("type")?.as_u64()?;
        let Some(kind) = MessageKind::from_code(code) else {
            trace!(code, "Ignoring message with unknown kind");
            return None;
        };
        let data = raw.get("data").cloned().unwrap_or(Value::Null);

        match kind {
            MessageKind::Render => None,
            MessageKind::Remove => Some(Self::Remove),
            MessageKind::Resize => Some(Self::Resize {
                width: pixel_length(data.get("width")),
                height: pixel_length(data.get("height")),
            }),
            MessageKind::SwitchToInlineMenu => Some(Self::SwitchToInlineMenu),
            MessageKind::FillWithCredential => Some(Self::FillWithCredential { credential: data }),
            MessageKind::FillSingleField => {
                let payload: FillSingleFieldPayload = decode(data)?;
                Some(Self::FillSingleField {
                    text: payload.text,
                    append_value: payload.append_value,
                })
            }
            MessageKind::ItemCreated => {
                let payload: ItemCreatedPayload = decode(data)?;
                Some(Self::ItemCreated {
                    credential: payload.credential,
                    message: payload.message,
                })
            }
            MessageKind::ShowCreateDialog => Some(Self::ShowCreateDialog),
            MessageKind::ShowToast => Some(Self::ShowToast {
                message: data.as_str().unwrap_or_default().to_string(),
            }),
            MessageKind::SuppressMenus => Some(Self::SuppressMenus),
            MessageKind::ColorSchemeChanged => Some(Self::ColorSchemeChanged {
                scheme: data.as_str().unwrap_or_default().to_string(),
            }),
            MessageKind::RedirectUrl => Some(Self::RedirectUrl {
                url: data.as_str()?.to_string(),
            }),
            MessageKind::CopyText => Some(Self::CopyText {
                text: data.as_str()?.to_string(),
            }),
            MessageKind::ShowLargeText => Some(Self::ShowLargeText),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(data: Value) -> Option<T> {
    serde_json::from_value(data)
        .map_err(OverlayError::from)
        .warn_on_err()
}

/// Lenient pixel parse: accepts JSON numbers and CSS-ish strings ("240px").
/// Anything without a leading numeric value decays to 0.
fn pixel_length(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let numeric: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            numeric.parse().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Host-page context bundled into the `render` message.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_base64: Option<String>,
    /// Height budget when the inline menu must render truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_height: Option<f64>,
}

/// Build the `render` message for the inline menu and create-entry dialog.
pub fn render_message(kind: OverlayKind, page: &PageInfo, show_scrollbars: bool) -> Value {
    json!({
        "type": MessageKind::Render.code(),
        "data": {
            "componentKind": kind.code(),
            "pageInfo": page,
            "showScrollbars": show_scrollbars,
        },
    })
}

/// Build the `render` message for the notification toast.
pub fn render_toast_message(message: &str) -> Value {
    json!({
        "type": MessageKind::Render.code(),
        "data": {
            "componentKind": OverlayKind::NotificationToast.code(),
            "message": message,
        },
    })
}
