//! Autofill overlay session controller.
//!
//! This library owns the lifecycle of a single isolated overlay (an embedded
//! rendering context attached next to a form field) that presents autofill
//! UI, a "create entry" dialog, or a transient notification. It routes the
//! typed message protocol between the host page and the overlay content,
//! computes viewport-aware placement relative to an anchor element, and keeps
//! host-page listeners from accumulating across repeated open/close cycles.
//!
//! The host environment (real DOM, clipboard, navigation, icon fetch,
//! settings storage) plugs in through the traits in [`host`] and [`bridge`];
//! everything else is pure, single-threaded, event-driven logic.

pub mod bridge;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod host;
pub mod listeners;
pub mod logging;
pub mod placement;
pub mod protocol;
pub mod session;
pub mod truncation;


pub use controller::{OverlayController, CLICK_SETTLE_DELAY};
pub use session::{OverlayKind, SessionPhase};
