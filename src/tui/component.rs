use crate::tui::action::Action;
use crate::tui::theme::Theme;
use color_eyre::Result;
use ratatui::{layout::Rect, Frame};

/// A pane of the main screen
///
/// Components own only view state (cursor, scroll, inline editors). Changes to
/// the session go through the `App`, which pushes fresh snapshots back into
/// the components before each draw.
pub trait Component {
    /// Apply a navigation-style action
    ///
    /// `Ok(true)` means the action was consumed; `Ok(false)` lets the caller
    /// try it elsewhere.
    fn handle_action(&mut self, action: Action) -> Result<bool>;

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme);

    /// Actions listed in the footer hints while this pane has focus
    fn supported_actions(&self) -> &[Action];

    fn name(&self) -> &str;
}

/// A pane that takes part in Tab focus cycling
pub trait Focusable: Component {
    fn is_focused(&self) -> bool;

    fn set_focused(&mut self, focused: bool);
}
