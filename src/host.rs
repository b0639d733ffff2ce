//! Traits the embedding environment implements.
//!
//! The controller never touches a real document. Everything it needs from the
//! host page (geometry queries, node creation, event delivery, frame
//! scheduling) comes through these traits, which keeps the lifecycle and
//! routing logic testable without a browser.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::OverlayError;
use crate::geometry::{Rect, Size};

/// Keys the controller reacts to on host-page keyup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKey {
    /// Dismisses the overlay.
    Escape,
    /// Dismisses the overlay when focus has left the anchor.
    Tab,
    /// Moves keyboard focus into the embedded context.
    ArrowDown,
    Other,
}

impl PageKey {
    pub fn from_key(key: &str) -> Self {
        match key {
            "Escape" => Self::Escape,
            "Tab" => Self::Tab,
            "ArrowDown" => Self::ArrowDown,
            _ => Self::Other,
        }
    }
}

/// Host-page events delivered to the installed page listener.
pub enum PageEvent {
    /// The page scrolled; the inline menu follows its anchor.
    Scrolled,
    /// The user clicked somewhere in the host page.
    Clicked(Arc<dyn ClickTarget>),
    /// A key was released in the host page.
    KeyUp(PageKey),
    /// A raw protocol message arrived from the embedded context.
    Message(Value),
}

/// Initial sizing/position applied to a freshly created host node, chosen per
/// overlay kind before any content has rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialLayout {
    /// Directly under the anchor at zero size; the true size arrives via a
    /// later `resize` message and triggers a reposition.
    InlineMenu { top: f64, left: f64 },
    /// Document-relative 0,0 to 100%x100%.
    FullViewport,
    /// Anchored to the bottom edge, horizontal span left to layout defaults.
    BottomToast,
}

/// A form-field element in the host document. The controller holds this
/// non-owningly and must tolerate the element disappearing at any time.
pub trait AnchorElement {
    /// Bounding rectangle in viewport coordinates, or `None` when the element
    /// is detached from the document.
    fn bounding_rect(&self) -> Option<Rect>;

    /// Return keyboard focus to the element. Must not fail when the element
    /// is gone or not focusable.
    fn focus(&self);

    /// Whether the element currently is the document's active element.
    fn is_active_element(&self) -> bool;
}

/// The element a host-page click landed on, queried after the settle delay so
/// synchronous DOM mutations triggered by the click have already happened.
pub trait ClickTarget {
    /// Whether the anchor is still among the click target's siblings.
    fn is_sibling_of_anchor(&self, anchor: &dyn AnchorElement) -> bool;
}

/// The single overlay host node plus its embedded rendering context.
///
/// The host inserts the node at the end of the document body so it paints
/// above all host-page content, and owns the isolation details (sandboxing,
/// the global visibility style rule).
pub trait OverlayNode {
    fn apply_layout(&self, layout: InitialLayout);
    fn set_position(&self, top: f64, left: f64);
    fn set_size(&self, width: f64, height: f64);
    /// Current rendered size, used when a reposition has no explicit size.
    fn size(&self) -> Size;
    /// Forward a color-scheme value onto the node's rendering hints.
    fn set_color_scheme(&self, scheme: &str);
    /// Post a protocol message into the embedded context.
    fn post_message(&self, message: Value);
    /// Move keyboard focus into the embedded context.
    fn focus_embedded(&self);
    /// Register the one-shot callback fired when the embedded context has
    /// loaded and can receive its `render` message.
    fn set_ready_callback(&self, callback: Box<dyn FnOnce()>);
    /// Detach the node from the document. Idempotent.
    fn detach(&self);
}

/// The host document itself.
pub trait HostPage {
    fn viewport_size(&self) -> Size;
    /// Bounding rectangle of the page content container (the document body),
    /// used for the truncation estimate.
    fn body_rect(&self) -> Rect;
    fn page_title(&self) -> String;
    fn page_url(&self) -> String;

    /// Build the overlay host node and its embedded context. Failure is
    /// logged by the caller and the overlay simply does not appear.
    fn create_overlay_node(&self) -> Result<Arc<dyn OverlayNode>, OverlayError>;

    /// Install the page-level listener (scroll, click, keyup, message).
    /// Called at most once per controller lifetime.
    fn install_page_listener(&self, listener: Box<dyn Fn(PageEvent)>);
}

/// Cooperative deferral points: paint-frame scheduling and short delays.
pub trait FrameScheduler {
    /// Run `callback` on the next paint frame.
    fn request_frame(&self, callback: Box<dyn FnOnce()>);
    /// Run `callback` after a fixed delay.
    fn after_delay(&self, delay: Duration, callback: Box<dyn FnOnce()>);
}
