use crate::core::{Condition, ConditionId, GroupedView, Operator};
use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_textarea::{Input, TextArea};

/// Part of a condition the cursor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConditionPart {
    #[default]
    Field,
    Operator,
    Value,
}

impl ConditionPart {
    fn next(self) -> Self {
        match self {
            ConditionPart::Field => ConditionPart::Operator,
            ConditionPart::Operator | ConditionPart::Value => ConditionPart::Value,
        }
    }

    fn prev(self) -> Self {
        match self {
            ConditionPart::Value => ConditionPart::Operator,
            ConditionPart::Operator | ConditionPart::Field => ConditionPart::Field,
        }
    }
}

/// Edit requested by cycling the column or operator of the selection
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderEdit {
    Field { id: ConditionId, field: String },
    Operator { id: ConditionId, operator: Operator },
}

/// Condition builder pane
///
/// Renders the grouped view with an AND divider between groups and an OR label
/// before every non-root member. Holds the cursor and the inline value editor;
/// the tree itself lives in the `DataService`.
pub struct ConditionBuilder {
    view: GroupedView,
    columns: Vec<String>,
    can_delete: bool,
    selected: usize,
    part: ConditionPart,
    editor: Option<(ConditionId, TextArea<'static>)>,
    value_error: Option<(ConditionId, String)>,
    scroll: usize,
    focused: bool,
    supported_actions: Vec<Action>,
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self {
            view: GroupedView::default(),
            columns: Vec::new(),
            can_delete: false,
            selected: 0,
            part: ConditionPart::Field,
            editor: None,
            value_error: None,
            scroll: 0,
            focused: false,
            supported_actions: vec![
                Action::MoveUp,
                Action::MoveDown,
                Action::MoveLeft,
                Action::MoveRight,
                Action::PrevOption,
                Action::NextOption,
                Action::Confirm,
                Action::AddOrCondition,
                Action::AddAndGroup,
                Action::DeleteCondition,
            ],
        }
    }

    /// Replace the displayed tree, keeping the selection on the same
    /// condition when it still exists
    pub fn sync(&mut self, view: GroupedView, columns: &[String], can_delete: bool) {
        if view.revision() == self.view.revision() && self.columns == columns && !view.is_empty() {
            self.can_delete = can_delete;
            return;
        }
        let previous = self.selected_id();
        self.view = view;
        self.columns = columns.to_vec();
        self.can_delete = can_delete;

        if let Some(id) = previous {
            self.select(&id);
        }
        let len = self.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        if let Some((id, _)) = &self.editor {
            if self.position(id).is_none() {
                self.editor = None;
            }
        }
        if let Some((id, _)) = &self.value_error {
            if self.position(id).is_none() {
                self.value_error = None;
            }
        }
    }

    fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.view.iter().flat_map(|group| group.conditions().iter())
    }

    fn position(&self, id: &ConditionId) -> Option<usize> {
        self.conditions().position(|c| c.id == *id)
    }

    pub fn len(&self) -> usize {
        self.conditions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Move the cursor to `id`
    pub fn select(&mut self, id: &ConditionId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub fn selected_condition(&self) -> Option<&Condition> {
        self.conditions().nth(self.selected)
    }

    pub fn selected_id(&self) -> Option<ConditionId> {
        self.selected_condition().map(|c| c.id)
    }

    pub fn part(&self) -> ConditionPart {
        self.part
    }

    pub fn set_part(&mut self, part: ConditionPart) {
        self.part = part;
    }

    /// The edit that cycling the selected part would make
    ///
    /// Columns wrap around; the value part has nothing to cycle.
    pub fn cycle(&self, forward: bool) -> Option<BuilderEdit> {
        let condition = self.selected_condition()?;
        match self.part {
            ConditionPart::Field => {
                let len = self.columns.len();
                if len == 0 {
                    return None;
                }
                let current = self.columns.iter().position(|c| *c == condition.field).unwrap_or(0);
                let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
                Some(BuilderEdit::Field {
                    id: condition.id,
                    field: self.columns[next].clone(),
                })
            }
            ConditionPart::Operator => Some(BuilderEdit::Operator {
                id: condition.id,
                operator: if forward {
                    condition.operator.next()
                } else {
                    condition.operator.prev()
                },
            }),
            ConditionPart::Value => None,
        }
    }

    /// Open the inline editor on the selected condition's value
    pub fn begin_edit(&mut self) -> bool {
        let Some(condition) = self.selected_condition() else {
            return false;
        };
        let id = condition.id;
        let mut textarea = TextArea::default();
        textarea.insert_str(&condition.value);
        self.part = ConditionPart::Value;
        self.editor = Some((id, textarea));
        true
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_some()
    }

    pub fn editor_input(&mut self, key: KeyEvent) {
        if let Some((_, textarea)) = &mut self.editor {
            textarea.input(Input::from(key));
        }
    }

    /// Close the editor, returning the condition and the typed value
    pub fn finish_edit(&mut self) -> Option<(ConditionId, String)> {
        self.editor
            .take()
            .map(|(id, textarea)| (id, textarea.lines().join("")))
    }

    pub fn cancel_edit(&mut self) {
        self.editor = None;
    }

    /// Reopen the editor with a rejected value so it can be corrected
    pub fn reject_edit(&mut self, id: ConditionId, value: &str, message: String) {
        let mut textarea = TextArea::default();
        textarea.insert_str(value);
        self.editor = Some((id, textarea));
        self.value_error = Some((id, message));
    }

    pub fn value_error(&self) -> Option<&str> {
        self.value_error.as_ref().map(|(_, message)| message.as_str())
    }

    pub fn clear_value_error(&mut self) {
        self.value_error = None;
    }

    /// Flag or clear the stored value of `id` without opening the editor
    pub fn set_value_error(&mut self, id: ConditionId, message: Option<String>) {
        match message {
            Some(message) => self.value_error = Some((id, message)),
            None if self.value_error.as_ref().is_some_and(|(flagged, _)| *flagged == id) => {
                self.value_error = None;
            }
            None => {}
        }
    }

    fn condition_line(&self, condition: &Condition, is_root: bool, index: usize, theme: &Theme) -> Line<'static> {
        let selected = index == self.selected;
        let part_style = |part: ConditionPart| {
            if selected && self.part == part {
                if self.focused {
                    theme.selected_part_style()
                } else {
                    theme.selected_style()
                }
            } else {
                theme.normal_style()
            }
        };

        let marker = if selected { "▶ " } else { "  " };
        let mut spans = vec![Span::styled(marker, theme.info_style())];
        if is_root {
            spans.push(Span::raw("    "));
        } else {
            spans.push(Span::styled(" OR ", theme.or_label_style()));
        }
        spans.push(Span::styled(format!("[{}]", condition.field), part_style(ConditionPart::Field)));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("[{}]", condition.operator.label()),
            part_style(ConditionPart::Operator),
        ));
        spans.push(Span::raw(" "));
        let value_style = part_style(ConditionPart::Value);
        if condition.is_inert() {
            let style = if selected && self.part == ConditionPart::Value {
                value_style
            } else {
                theme.muted_style()
            };
            spans.push(Span::styled("(any)", style));
        } else {
            spans.push(Span::styled(format!("\"{}\"", condition.value), value_style));
        }
        if let Some((id, message)) = &self.value_error {
            if *id == condition.id {
                spans.push(Span::styled(format!("  ✗ {message}"), theme.error_style()));
            }
        }
        Line::from(spans)
    }

    fn lines(&self, theme: &Theme) -> (Vec<Line<'static>>, usize) {
        let mut lines = Vec::new();
        let mut selected_line = 0;
        let mut index = 0;
        for (g, group) in self.view.iter().enumerate() {
            if g > 0 {
                lines.push(Line::styled("  ──── AND ────", theme.and_divider_style()));
            }
            for (i, condition) in group.conditions().iter().enumerate() {
                if index == self.selected {
                    selected_line = lines.len();
                }
                lines.push(self.condition_line(condition, i == 0, index, theme));
                index += 1;
            }
        }
        (lines, selected_line)
    }

    fn hints(&self) -> String {
        let mut hints = vec!["←/→ part", "[/] cycle", "Enter edit", "o OR", "a AND"];
        if self.can_delete {
            hints.push("d delete");
        }
        format!(" {} ", hints.join(" · "))
    }
}

impl Component for ConditionBuilder {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        let len = self.len();
        match action {
            Action::MoveUp => {
                self.selected = self.selected.saturating_sub(1);
                Ok(true)
            }
            Action::MoveDown => {
                if self.selected + 1 < len {
                    self.selected += 1;
                }
                Ok(true)
            }
            Action::GoToTop => {
                self.selected = 0;
                Ok(true)
            }
            Action::GoToBottom => {
                self.selected = len.saturating_sub(1);
                Ok(true)
            }
            Action::MoveLeft => {
                self.part = self.part.prev();
                Ok(true)
            }
            Action::MoveRight => {
                self.part = self.part.next();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Conditions ({}) ", self.len()))
            .title_bottom(Line::styled(self.hints(), theme.muted_style()))
            .border_style(theme.pane_border(self.focused));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let (list_area, editor_area) = if self.editor.is_some() {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(3)])
                .split(inner);
            (chunks[0], Some(chunks[1]))
        } else {
            (inner, None)
        };

        if self.is_empty() {
            frame.render_widget(
                Paragraph::new("Load a data source to start filtering").style(theme.muted_style()),
                list_area,
            );
        } else {
            let (lines, selected_line) = self.lines(theme);
            let height = list_area.height as usize;
            if selected_line < self.scroll {
                self.scroll = selected_line;
            } else if height > 0 && selected_line >= self.scroll + height {
                self.scroll = selected_line + 1 - height;
            }
            let scroll = u16::try_from(self.scroll).unwrap_or(u16::MAX);
            frame.render_widget(
                Paragraph::new(lines).style(theme.normal_style()).scroll((scroll, 0)),
                list_area,
            );
        }

        if let (Some(editor_area), Some((_, textarea))) = (editor_area, &mut self.editor) {
            let border = if self.value_error.is_some() {
                theme.error_style()
            } else {
                theme.focused_border_style()
            };
            textarea.set_block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Value (Enter to apply, Esc to cancel) ")
                    .border_style(border),
            );
            textarea.set_cursor_line_style(theme.normal_style());
            frame.render_widget(&*textarea, editor_area);
        }
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "ConditionBuilder"
    }
}

impl Focusable for ConditionBuilder {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
