//! Overlay session state.
//!
//! A session describes which overlay mode is active, for which anchor field,
//! from one `initialize` call until it is superseded or removed. Deferred work
//! (paint-frame creation, icon fetches, fill completions) carries the session
//! token it was scheduled under and re-checks it before acting, so
//! continuations belonging to a superseded session become silent no-ops.

use std::sync::Arc;

use crate::host::AnchorElement;

/// Which overlay component is shown in the embedded context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    /// Credential menu attached directly under a form field.
    InlineFieldMenu,
    /// Full-viewport "create new entry" dialog.
    CreateEntryDialog,
    /// Transient notification anchored to the bottom edge.
    NotificationToast,
}

impl OverlayKind {
    /// Numeric wire code carried in the `render` payload. Fixed at build time;
    /// both sides of the boundary agree on these values.
    pub fn code(&self) -> u32 {
        match self {
            OverlayKind::InlineFieldMenu => 0,
            OverlayKind::CreateEntryDialog => 1,
            OverlayKind::NotificationToast => 2,
        }
    }
}

/// Monotonic identifier for one `initialize` generation.
pub type SessionToken = u64;

/// Lifecycle phase of the controller's current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No overlay requested.
    Idle,
    /// `initialize` ran; node creation is scheduled or in progress.
    Creating,
    /// The embedded context received its `render` message and is live.
    Active,
    /// The host node was torn down.
    Removed,
}

/// Live state for the single allowed overlay instance.
pub struct OverlaySession {
    pub kind: OverlayKind,
    /// Non-owning reference to the host-page form field. The field can be
    /// detached from the document at any time; geometry accessors return
    /// `None` and the session degrades to no-ops.
    pub anchor: Arc<dyn AnchorElement>,
    pub is_password_field: bool,
    /// Payload shown when `kind` is `NotificationToast`.
    pub toast_message: String,
    /// Height budget captured at creation when the menu must render
    /// truncated; forwarded inside the `render` payload.
    pub truncated_height: Option<f64>,
    pub token: SessionToken,
}
