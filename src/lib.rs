//! layermenu - a hierarchical context menu for wlr-layer-shell compositors.
//!
//! The menu tree is built from a tab-indented description (see [`parse`]),
//! laid out against the active output and presented as a stack of overlay
//! layer surfaces backed by shared-memory buffers. A single-threaded
//! dispatcher drains pointer, keyboard and compositor events from one
//! bounded queue until an item is activated or the menu is dismissed.

pub mod config;
pub mod draw;
pub mod event;
pub mod layout;
pub mod nav;
pub mod parse;
pub mod session;
pub mod surface;
pub mod text;
pub mod tree;

pub use config::{Color, ColorPair, Config, Palette};
pub use event::Event;
pub use nav::{CycleDir, Hit};
pub use parse::MenuLine;
pub use session::{Outcome, Session, SessionError};
pub use surface::SurfaceError;
pub use text::{FontShaper, TextShaper};
pub use tree::{MenuId, MenuTree, TreeError};
