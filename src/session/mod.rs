//! Session Registry (spec §4.4): single-active-session bookkeeping and
//! post-action application.

pub mod registry;

pub use registry::{apply_post_action, PopupHider, SessionRegistry};
