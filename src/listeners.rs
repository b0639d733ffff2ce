//! Host Listener Coordinator.
//!
//! The host-page listeners (scroll, outside-click, key navigation, protocol
//! messages) are installed at most once across the controller's entire
//! lifetime, not once per overlay. Repeated open/close cycles therefore never
//! accumulate listeners; re-initialization reuses the bindings installed on
//! first use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Weak;

use tracing::debug;

use crate::controller::OverlayController;
use crate::host::PageEvent;

/// One-shot latch guarding page listener installation.
pub struct ListenerCoordinator {
    installed: AtomicBool,
}

impl ListenerCoordinator {
    pub fn new() -> Self {
        ListenerCoordinator {
            installed: AtomicBool::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    /// Run `install` the first time this is called; every later call is a
    /// no-op.
    pub fn install_once<F: FnOnce()>(&self, install: F) {
        if self.installed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Installing host-page listeners");
        install();
    }
}

impl Default for ListenerCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the page listener closure handed to the host. Holds the controller
/// weakly so a dropped controller turns events into no-ops instead of keeping
/// it alive through the host's listener registry.
pub fn forwarding_listener(controller: Weak<OverlayController>) -> Box<dyn Fn(PageEvent)> {
    Box::new(move |event| {
        if let Some(controller) = controller.upgrade() {
            controller.handle_page_event(event);
        }
    })
}
