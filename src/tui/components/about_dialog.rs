use crate::tui::{Action, ActionCategory, KeyBindings, Theme};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    widgets::{Block, BorderType, Borders, Clear, Widget},
    Frame,
};

/// Modal with version information and the key reference
#[derive(Debug, Clone)]
pub struct AboutDialog {
    title: String,
    lines: Vec<(String, bool)>,
}

impl AboutDialog {
    pub fn new(version: &str, keybindings: &KeyBindings) -> Self {
        let mut lines: Vec<(String, bool)> = vec![
            (format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_DESCRIPTION")), true),
            (String::new(), false),
        ];
        lines.extend(version.lines().map(|l| (l.to_string(), false)));

        let categories = [
            ActionCategory::Navigation,
            ActionCategory::Conditions,
            ActionCategory::Data,
            ActionCategory::View,
            ActionCategory::Application,
        ];
        for category in categories {
            lines.push((String::new(), false));
            lines.push((category.to_string(), true));
            for action in Action::all().into_iter().filter(|a| a.category() == category) {
                let keys = keybindings.get_keys_for_action(action);
                if keys.is_empty() {
                    continue;
                }
                lines.push((format!("  {:<18} {}", keys.join(", "), action.description()), false));
            }
        }

        Self {
            title: " About ".to_string(),
            lines,
        }
    }

    /// Number of help lines (for tests and sizing)
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|(line, _)| line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn modal_area(area: Rect) -> Rect {
        let width = area.width.saturating_sub(4).clamp(20, 72).min(area.width);
        let height = area.height.saturating_sub(2).max(5).min(area.height);
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect { x, y, width, height }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let modal = Self::modal_area(area);
        frame.render_widget(Clear, modal);
        self.render_into(modal, frame.buffer_mut(), theme);
    }

    fn render_into(&self, modal: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(theme.focused_border_style())
            .style(theme.normal_style());
        let inner = block.inner(modal);
        block.render(modal, buf);

        let wrap_width = inner.width.saturating_sub(2).max(1) as usize;
        let mut y = inner.y;
        let bottom = inner.y + inner.height.saturating_sub(1);
        'outer: for (line, emphasized) in &self.lines {
            let style = if *emphasized {
                theme.header_style().add_modifier(Modifier::BOLD)
            } else {
                theme.normal_style()
            };
            let wrapped = textwrap::wrap(line, wrap_width);
            if wrapped.is_empty() {
                y += 1;
            }
            for piece in wrapped {
                if y >= bottom {
                    break 'outer;
                }
                buf.set_string(inner.x + 1, y, piece.as_ref(), style);
                y += 1;
            }
        }

        let hint = "Esc/Enter/? to close";
        let hint_x = inner.x + inner.width.saturating_sub(hint.len() as u16 + 1);
        buf.set_string(hint_x, bottom, hint, theme.muted_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_condition_keys() {
        let dialog = AboutDialog::new("0.1.0 (built today)", &KeyBindings::default());
        let text = dialog.text();
        assert!(text.contains("0.1.0 (built today)"));
        assert!(text.contains("Conditions"));
        assert!(text.contains("Add AND group"));
        assert!(text.contains("F2, T"));
        assert!(dialog.line_count() > 10);
    }

    #[test]
    fn test_render_into_small_area() {
        let dialog = AboutDialog::new("0.1.0", &KeyBindings::default());
        let area = Rect::new(0, 0, 30, 8);
        let mut buf = Buffer::empty(area);
        dialog.render_into(AboutDialog::modal_area(area), &mut buf, &Theme::default());
    }
}
