//! Terminal User Interface components for folio-tui.

mod help;
pub mod theme;
pub mod widgets;

pub use help::HelpOverlay;
pub use theme::Theme;
