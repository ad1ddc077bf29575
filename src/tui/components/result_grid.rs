use crate::core::Row as DataRow;
use crate::tui::{Action, Component, Focusable, Theme};
use color_eyre::Result;
use ratatui::{
    layout::{Constraint, Rect},
    text::Line,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};
use std::sync::Arc;

/// Position in the grid (row within the filtered set, first visible column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// Result grid showing the filtered rows one page at a time
pub struct ResultGrid {
    rows: Arc<Vec<DataRow>>,
    columns: Vec<String>,
    total: usize,
    page_size: usize,
    column_width: u16,
    cursor: Position,
    /// First visible row within the current page
    top: usize,
    height: usize,
    focused: bool,
    supported_actions: Vec<Action>,
}

impl ResultGrid {
    pub fn new(page_size: usize, column_width: u16) -> Self {
        Self {
            rows: Arc::new(Vec::new()),
            columns: Vec::new(),
            total: 0,
            page_size: page_size.max(1),
            column_width: column_width.max(4),
            cursor: Position::default(),
            top: 0,
            height: 20,
            focused: false,
            supported_actions: vec![
                Action::MoveUp,
                Action::MoveDown,
                Action::MoveLeft,
                Action::MoveRight,
                Action::PageUp,
                Action::PageDown,
                Action::GoToTop,
                Action::GoToBottom,
                Action::Copy,
                Action::Export,
            ],
        }
    }

    /// Show a new filtered set
    ///
    /// The cursor is kept when the same rows are pushed again and reset when
    /// the set changes.
    pub fn set_rows(&mut self, rows: Arc<Vec<DataRow>>, columns: Vec<String>, total: usize) {
        if !Arc::ptr_eq(&self.rows, &rows) {
            self.cursor.row = 0;
            self.top = 0;
        }
        if self.columns != columns {
            self.cursor.col = 0;
        }
        self.rows = rows;
        self.columns = columns;
        self.total = total;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn filtered(&self) -> usize {
        self.rows.len()
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn selected_row(&self) -> Option<&DataRow> {
        self.rows.get(self.cursor.row)
    }

    pub fn page(&self) -> usize {
        self.cursor.row / self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.rows.len().div_ceil(self.page_size).max(1)
    }

    fn page_start(&self) -> usize {
        self.page() * self.page_size
    }

    fn page_len(&self) -> usize {
        self.rows.len().saturating_sub(self.page_start()).min(self.page_size)
    }

    fn last_row(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    fn move_to(&mut self, row: usize) {
        let previous_page = self.page();
        self.cursor.row = row.min(self.last_row());
        if self.page() != previous_page {
            self.top = 0;
        }
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let in_page = self.cursor.row - self.page_start();
        let height = self.height.max(1);
        if in_page < self.top {
            self.top = in_page;
        } else if in_page >= self.top + height {
            self.top = in_page + 1 - height;
        }
    }

    /// Cell text for display: ANSI escapes removed, single line
    fn display_text(row: &DataRow, column: &str) -> String {
        let text = if column == "id" { row.id.clone() } else { row.text(column) };
        strip_ansi_escapes::strip_str(&text).replace(['\n', '\r', '\t'], " ")
    }
}

impl Component for ResultGrid {
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::MoveUp => self.move_to(self.cursor.row.saturating_sub(1)),
            Action::MoveDown => self.move_to(self.cursor.row + 1),
            Action::PageUp => {
                let target = self.page_start().saturating_sub(self.page_size);
                self.move_to(target);
            }
            Action::PageDown => {
                let target = self.page_start() + self.page_size;
                if target < self.rows.len() {
                    self.move_to(target);
                }
            }
            Action::GoToTop => self.move_to(0),
            Action::GoToBottom => self.move_to(self.last_row()),
            Action::MoveLeft => self.cursor.col = self.cursor.col.saturating_sub(1),
            Action::MoveRight => {
                if self.cursor.col + 1 < self.columns.len() {
                    self.cursor.col += 1;
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        // Borders plus header row
        self.height = area.height.saturating_sub(3) as usize;
        if !self.rows.is_empty() {
            self.ensure_cursor_visible();
        }

        let visible_columns: Vec<&String> = self.columns.iter().skip(self.cursor.col).collect();
        let header = Row::new(
            visible_columns
                .iter()
                .map(|name| Cell::from(name.as_str())),
        )
        .style(theme.header_style());

        let start = self.page_start() + self.top;
        let end = (self.page_start() + self.page_len()).min(start + self.height);
        let rows: Vec<Row> = self.rows[start.min(end)..end]
            .iter()
            .enumerate()
            .map(|(offset, data)| {
                let index = start + offset;
                let style = if index == self.cursor.row {
                    theme.selected_style()
                } else if index % 2 == 1 {
                    theme.alt_row_style()
                } else {
                    theme.normal_style()
                };
                Row::new(
                    visible_columns
                        .iter()
                        .map(|column| Cell::from(Self::display_text(data, column))),
                )
                .style(style)
            })
            .collect();

        let widths = vec![Constraint::Length(self.column_width); visible_columns.len().max(1)];
        let position = if self.rows.is_empty() {
            "no rows".to_string()
        } else {
            format!(
                "row {}/{} · page {}/{}",
                self.cursor.row + 1,
                self.rows.len(),
                self.page() + 1,
                self.page_count()
            )
        };
        let table = Table::new(rows, widths)
            .header(header)
            .style(theme.normal_style())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Total: {}  Filtered: {} ", self.total, self.rows.len()))
                    .title_bottom(Line::styled(format!(" {position} "), theme.muted_style()))
                    .border_style(theme.pane_border(self.focused)),
            );

        frame.render_widget(table, area);
    }

    fn supported_actions(&self) -> &[Action] {
        &self.supported_actions
    }

    fn name(&self) -> &str {
        "ResultGrid"
    }
}

impl Focusable for ResultGrid {
    fn is_focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
