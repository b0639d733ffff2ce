//! Collaborator capabilities consumed by the controller.
//!
//! Fill actions, clipboard writes, URL launches, icon and settings fetches
//! all live behind [`PageBridge`]. The controller invokes these but never
//! implements them; implementations are expected to resolve to a safe empty
//! result rather than raise, since the controller has no error-reporting path
//! back to the user.
//!
//! Fetches and fill actions are asynchronous in completion-callback style.
//! The controller token-guards every completion, so a callback that fires
//! after its session was superseded becomes a silent no-op.

use std::sync::Arc;

use serde_json::Value;

use crate::host::AnchorElement;

/// User-facing settings relevant to overlay rendering.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSettings {
    pub show_scrollbars: bool,
    pub hide_details: bool,
}

/// A resolved site icon for the current page.
#[derive(Debug, Clone)]
pub struct FavIcon {
    pub url: String,
    /// Encoded image data (base64).
    pub base64_data: String,
}

/// Completion callback for asynchronous collaborator calls.
pub type Done = Box<dyn FnOnce()>;

/// Host-integration capabilities the overlay delegates to.
pub trait PageBridge {
    /// Fetch current user-facing settings.
    fn fetch_settings(&self, respond: Box<dyn FnOnce(UserSettings)>);

    /// Fetch a representative site icon for the current page. Resolves to
    /// `None` when no usable icon exists.
    fn fetch_fav_icon(&self, respond: Box<dyn FnOnce(Option<FavIcon>)>);

    /// Autofill the page with a credential. `done` fires once the fill has
    /// taken effect; the overlay is only torn down afterwards.
    fn fill_with_credential(
        &self,
        credential: Value,
        anchor: Arc<dyn AnchorElement>,
        is_password_field: bool,
        done: Done,
    );

    /// Fill a single field with text, optionally appending to the current
    /// value instead of replacing it.
    fn fill_single_field(&self, text: String, anchor: Arc<dyn AnchorElement>, append: bool, done: Done);

    /// A new item was created through the overlay dialog.
    fn item_created(&self, credential: Value, message: String);

    /// Navigate the page to a URL.
    fn launch_url(&self, url: String) -> anyhow::Result<()>;

    /// Write text to the clipboard.
    fn copy_text(&self, text: String) -> anyhow::Result<()>;

    /// Request that inline menus stay hidden for a short window.
    fn set_suppress_inline_menus(&self, suppress: bool);

    /// Request the large-text view.
    fn set_show_large_text(&self, show: bool);
}
