//! Overlay Session Controller.
//!
//! Owns the lifecycle of the single isolated overlay, routes the typed
//! cross-boundary message protocol, and drives placement and truncation.
//! The state machine is Idle -> Creating -> Active -> Removed, with
//! re-entrant transitions (several message kinds re-enter `initialize` to
//! switch overlay type) guarded by a session token: every deferred
//! continuation re-checks the token and silently no-ops when its session has
//! been superseded.
//!
//! Single-threaded, event-driven model. No lock is held across host, bridge,
//! or scheduler calls, so handlers that re-enter the controller are safe.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::bridge::{FavIcon, PageBridge, UserSettings};
use crate::error::ResultExt;
use crate::geometry::Size;
use crate::host::{
    AnchorElement, ClickTarget, FrameScheduler, HostPage, InitialLayout, OverlayNode, PageEvent,
    PageKey,
};
use crate::listeners::{forwarding_listener, ListenerCoordinator};
use crate::placement;
use crate::protocol::{self, InboundMessage, PageInfo};
use crate::session::{OverlayKind, OverlaySession, SessionPhase, SessionToken};
use crate::truncation;

/// Settle delay after a host-page click before the dismissal check runs.
/// Tolerates synchronous DOM mutations triggered by the click itself.
pub const CLICK_SETTLE_DELAY: Duration = Duration::from_millis(100);

struct ControllerState {
    phase: SessionPhase,
    session: Option<OverlaySession>,
    /// Owned handle to the current overlay host node. This is the source of
    /// truth for "an overlay exists"; there is no global document query.
    node: Option<Arc<dyn OverlayNode>>,
    next_token: SessionToken,
}

/// Orchestrates overlay creation, positioning, message routing, and teardown.
pub struct OverlayController {
    host: Arc<dyn HostPage>,
    bridge: Arc<dyn PageBridge>,
    scheduler: Arc<dyn FrameScheduler>,
    listeners: ListenerCoordinator,
    state: Mutex<ControllerState>,
}

impl OverlayController {
    pub fn new(
        host: Arc<dyn HostPage>,
        bridge: Arc<dyn PageBridge>,
        scheduler: Arc<dyn FrameScheduler>,
    ) -> Arc<Self> {
        Arc::new(OverlayController {
            host,
            bridge,
            scheduler,
            listeners: ListenerCoordinator::new(),
            state: Mutex::new(ControllerState {
                phase: SessionPhase::Idle,
                session: None,
                node: None,
                next_token: 0,
            }),
        })
    }

    /// Open (or re-open) the overlay next to `anchor`.
    ///
    /// Synchronously removes any existing overlay, then schedules creation on
    /// the next paint frame. A burst of calls within one frame collapses to
    /// exactly one created overlay reflecting the parameters of the last
    /// call: creation is exclusive on the host node and reads its parameters
    /// from controller state at callback time.
    pub fn initialize(
        self: &Arc<Self>,
        kind: OverlayKind,
        anchor: Arc<dyn AnchorElement>,
        is_password_field: bool,
        toast_message: impl Into<String>,
    ) {
        self.listeners.install_once(|| {
            self.host
                .install_page_listener(forwarding_listener(Arc::downgrade(self)));
        });

        self.remove();

        let token = {
            let mut state = self.state.lock();
            state.next_token += 1;
            let token = state.next_token;
            state.session = Some(OverlaySession {
                kind,
                anchor,
                is_password_field,
                toast_message: toast_message.into(),
                truncated_height: None,
                token,
            });
            state.phase = SessionPhase::Creating;
            token
        };
        debug!(?kind, token, "Overlay session initialized");

        let weak = Arc::downgrade(self);
        self.scheduler.request_frame(Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                controller.create(token);
            }
        }));
    }

    /// Remove the overlay host node from the document if present. Safe to
    /// call when no overlay exists.
    pub fn remove(&self) {
        let node = {
            let mut state = self.state.lock();
            let node = state.node.take();
            // Also invalidates a creation that is still pending its frame.
            if node.is_some() || state.phase == SessionPhase::Creating {
                state.phase = SessionPhase::Removed;
            }
            node
        };
        if let Some(node) = node {
            node.detach();
            debug!("Overlay removed");
        }
    }

    /// Recompute and apply the inline menu's position. Without explicit
    /// dimensions the node's current rendered size is used. A detached anchor
    /// makes this a no-op.
    pub fn position_inline_menu(&self, width: Option<f64>, height: Option<f64>) {
        let (node, anchor) = {
            let state = self.state.lock();
            match (&state.session, &state.node) {
                (Some(session), Some(node)) => (node.clone(), session.anchor.clone()),
                _ => return,
            }
        };
        let Some(anchor_rect) = anchor.bounding_rect() else {
            return;
        };

        let fallback = node.size();
        let overlay = Size::new(
            width.unwrap_or(fallback.width),
            height.unwrap_or(fallback.height),
        );
        let position = placement::compute_position(anchor_rect, overlay, self.host.viewport_size());
        node.set_position(position.top, position.left);
    }

    /// Return keyboard focus to the anchor on the next paint frame. Tolerates
    /// the anchor no longer existing or being focusable.
    pub fn restore_focus(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        self.scheduler.request_frame(Box::new(move || {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            let anchor = {
                let state = controller.state.lock();
                state.session.as_ref().map(|s| s.anchor.clone())
            };
            if let Some(anchor) = anchor {
                anchor.focus();
            }
        }));
    }

    /// Current lifecycle phase, mainly for host integrations and tests.
    pub fn phase(&self) -> SessionPhase {
        self.state.lock().phase
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    fn create(self: &Arc<Self>, token: SessionToken) {
        let (kind, anchor) = {
            let state = self.state.lock();
            // Creation is exclusive: a second attempt in the same frame batch
            // observes the existing node and aborts.
            if state.node.is_some() {
                return;
            }
            if state.phase != SessionPhase::Creating {
                return;
            }
            match state.session.as_ref() {
                Some(session) if session.token == token => (session.kind, session.anchor.clone()),
                _ => return,
            }
        };

        let (layout, truncated_height) = match kind {
            OverlayKind::InlineFieldMenu => {
                let Some(anchor_rect) = anchor.bounding_rect() else {
                    debug!(token, "Anchor detached before creation, skipping overlay");
                    self.reset_to_idle(token);
                    return;
                };
                let truncated =
                    truncation::estimate_truncated_height(anchor_rect, self.host.body_rect());
                (
                    InitialLayout::InlineMenu {
                        top: anchor_rect.bottom,
                        left: anchor_rect.left,
                    },
                    truncated,
                )
            }
            OverlayKind::CreateEntryDialog => (InitialLayout::FullViewport, None),
            OverlayKind::NotificationToast => (InitialLayout::BottomToast, None),
        };

        let Some(node) = self.host.create_overlay_node().log_err() else {
            self.reset_to_idle(token);
            return;
        };
        node.apply_layout(layout);

        {
            let mut state = self.state.lock();
            let current = state.phase == SessionPhase::Creating
                && state.session.as_ref().is_some_and(|s| s.token == token)
                && state.node.is_none();
            if !current {
                // Superseded while the node was being built; discard it.
                drop(state);
                node.detach();
                return;
            }
            if let Some(session) = state.session.as_mut() {
                session.truncated_height = truncated_height;
            }
            state.node = Some(node.clone());
        }

        let weak = Arc::downgrade(self);
        node.set_ready_callback(Box::new(move || {
            if let Some(controller) = weak.upgrade() {
                controller.on_embedded_ready(token);
            }
        }));
        trace!(token, "Overlay host node created");
    }

    fn reset_to_idle(&self, token: SessionToken) {
        let mut state = self.state.lock();
        if state.session.as_ref().is_some_and(|s| s.token == token) {
            state.phase = SessionPhase::Idle;
        }
    }

    /// The embedded context finished loading: gather host-page context and
    /// send exactly one `render` message. The icon and settings fetches are
    /// asynchronous; a session superseded in the meantime discards the result.
    fn on_embedded_ready(self: &Arc<Self>, token: SessionToken) {
        let kind = {
            let state = self.state.lock();
            match (&state.session, &state.node) {
                (Some(session), Some(_)) if session.token == token => session.kind,
                _ => return,
            }
        };

        match kind {
            OverlayKind::InlineFieldMenu | OverlayKind::CreateEntryDialog => {
                let weak = Arc::downgrade(self);
                self.bridge.fetch_settings(Box::new(move |settings| {
                    let Some(controller) = weak.upgrade() else {
                        return;
                    };
                    let weak = Arc::downgrade(&controller);
                    controller.bridge.fetch_fav_icon(Box::new(move |icon| {
                        if let Some(controller) = weak.upgrade() {
                            controller.send_render(token, settings, icon);
                        }
                    }));
                }));
            }
            OverlayKind::NotificationToast => {
                let (node, message) = {
                    let state = self.state.lock();
                    match (&state.session, &state.node) {
                        (Some(session), Some(node)) if session.token == token => {
                            (node.clone(), session.toast_message.clone())
                        }
                        _ => return,
                    }
                };
                node.post_message(protocol::render_toast_message(&message));
                self.mark_active(token);
            }
        }
    }

    fn send_render(&self, token: SessionToken, settings: UserSettings, icon: Option<FavIcon>) {
        let (node, kind, truncated_height) = {
            let state = self.state.lock();
            match (&state.session, &state.node) {
                (Some(session), Some(node)) if session.token == token => {
                    (node.clone(), session.kind, session.truncated_height)
                }
                _ => return,
            }
        };

        let (fav_icon_url, fav_icon_base64) = match icon {
            Some(icon) => (Some(icon.url), Some(icon.base64_data)),
            None => (None, None),
        };
        let page = PageInfo {
            title: self.host.page_title(),
            url: self.host.page_url(),
            fav_icon_url,
            fav_icon_base64,
            truncated_height,
        };

        node.post_message(protocol::render_message(kind, &page, settings.show_scrollbars));
        self.mark_active(token);
        debug!(token, "Render message sent");
    }

    fn mark_active(&self, token: SessionToken) {
        let mut state = self.state.lock();
        if state.node.is_some() && state.session.as_ref().is_some_and(|s| s.token == token) {
            state.phase = SessionPhase::Active;
        }
    }

    // ------------------------------------------------------------------
    // Host-page events
    // ------------------------------------------------------------------

    pub(crate) fn handle_page_event(self: &Arc<Self>, event: PageEvent) {
        match event {
            PageEvent::Scrolled => {
                if self.session_kind() == Some(OverlayKind::InlineFieldMenu) {
                    self.position_inline_menu(None, None);
                }
            }
            PageEvent::Clicked(target) => self.handle_outside_click(target),
            PageEvent::KeyUp(key) => self.handle_keyup(key),
            PageEvent::Message(raw) => match InboundMessage::parse(&raw) {
                Some(message) => self.dispatch(message),
                None => trace!("Ignoring unrecognized page message"),
            },
        }
    }

    fn handle_keyup(&self, key: PageKey) {
        match key {
            PageKey::Escape => self.remove(),
            PageKey::Tab => {
                // Tab dismisses only once focus has actually left the anchor.
                let anchor = self.session_anchor();
                if let Some(anchor) = anchor {
                    if !anchor.is_active_element() {
                        self.remove();
                    }
                }
            }
            PageKey::ArrowDown => {
                let node = { self.state.lock().node.clone() };
                if let Some(node) = node {
                    node.focus_embedded();
                }
            }
            PageKey::Other => {}
        }
    }

    fn handle_outside_click(self: &Arc<Self>, target: Arc<dyn ClickTarget>) {
        let weak = Arc::downgrade(self);
        self.scheduler.after_delay(
            CLICK_SETTLE_DELAY,
            Box::new(move || {
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                let anchor = {
                    let state = controller.state.lock();
                    if state.node.is_none() {
                        return;
                    }
                    state.session.as_ref().map(|s| s.anchor.clone())
                };
                let Some(anchor) = anchor else {
                    return;
                };
                if !target.is_sibling_of_anchor(anchor.as_ref()) {
                    controller.remove();
                }
            }),
        );
    }

    // ------------------------------------------------------------------
    // Message router
    // ------------------------------------------------------------------

    fn dispatch(self: &Arc<Self>, message: InboundMessage) {
        match message {
            InboundMessage::Remove => self.remove(),

            InboundMessage::Resize { width, height } => {
                let (node, kind) = {
                    let state = self.state.lock();
                    match (&state.session, &state.node) {
                        (Some(session), Some(node)) => (node.clone(), session.kind),
                        _ => return,
                    }
                };
                node.set_size(width, height);
                if kind == OverlayKind::InlineFieldMenu {
                    self.position_inline_menu(Some(width), Some(height));
                }
            }

            InboundMessage::SwitchToInlineMenu => {
                if let Some(anchor) = self.session_anchor() {
                    self.initialize(OverlayKind::InlineFieldMenu, anchor, false, "");
                }
            }

            InboundMessage::FillWithCredential { credential } => {
                let (anchor, is_password_field, token) = {
                    let state = self.state.lock();
                    match state.session.as_ref() {
                        Some(s) => (s.anchor.clone(), s.is_password_field, s.token),
                        None => return,
                    }
                };
                // Tear down only once the fill has taken effect.
                let weak = Arc::downgrade(self);
                self.bridge.fill_with_credential(
                    credential,
                    anchor,
                    is_password_field,
                    Box::new(move || {
                        if let Some(controller) = weak.upgrade() {
                            controller.remove_if_current(token);
                        }
                    }),
                );
            }

            InboundMessage::FillSingleField { text, append_value } => {
                let (anchor, token) = {
                    let state = self.state.lock();
                    match state.session.as_ref() {
                        Some(s) => (s.anchor.clone(), s.token),
                        None => return,
                    }
                };
                // Append mode keeps the overlay open for further edits.
                let weak = Arc::downgrade(self);
                self.bridge.fill_single_field(
                    text,
                    anchor,
                    append_value,
                    Box::new(move || {
                        if !append_value {
                            if let Some(controller) = weak.upgrade() {
                                controller.remove_if_current(token);
                            }
                        }
                    }),
                );
            }

            InboundMessage::ItemCreated {
                credential,
                message,
            } => {
                self.bridge.item_created(credential, message);
                self.remove();
            }

            InboundMessage::ShowCreateDialog => {
                if let Some(anchor) = self.session_anchor() {
                    self.initialize(OverlayKind::CreateEntryDialog, anchor, false, "");
                }
            }

            InboundMessage::ShowToast { message } => {
                if let Some(anchor) = self.session_anchor() {
                    self.initialize(OverlayKind::NotificationToast, anchor, false, message);
                }
            }

            InboundMessage::SuppressMenus => self.bridge.set_suppress_inline_menus(true),

            InboundMessage::ShowLargeText => self.bridge.set_show_large_text(true),

            InboundMessage::ColorSchemeChanged { scheme } => {
                let node = { self.state.lock().node.clone() };
                if let Some(node) = node {
                    node.set_color_scheme(&scheme);
                }
            }

            InboundMessage::RedirectUrl { url } => {
                self.bridge.launch_url(url).log_err();
            }

            InboundMessage::CopyText { text } => {
                self.bridge.copy_text(text).log_err();
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn session_anchor(&self) -> Option<Arc<dyn AnchorElement>> {
        self.state.lock().session.as_ref().map(|s| s.anchor.clone())
    }

    fn session_kind(&self) -> Option<OverlayKind> {
        self.state.lock().session.as_ref().map(|s| s.kind)
    }

    /// Remove only when `token` still identifies the current session, so a
    /// slow fill completion cannot tear down a successor overlay.
    fn remove_if_current(&self, token: SessionToken) {
        let current = {
            let state = self.state.lock();
            state.session.as_ref().is_some_and(|s| s.token == token)
        };
        if current {
            self.remove();
        }
    }
}
