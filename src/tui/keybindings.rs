use crate::tui::action::Action;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;

/// File name looked up in the config directory for user keybindings
pub const KEYBINDINGS_FILE: &str = "keybindings.json";

/// Maps KeyEvents to Actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(rename = "bindings")]
    bindings_list: Vec<KeyBinding>,

    #[serde(skip)]
    bindings_map: HashMap<KeyPattern, Action>,
}

/// Single keybinding entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    pub action: Action,
}

/// Pattern for matching key events
///
/// Character keys carry their shift state in the character itself, so `T`
/// and `?` match regardless of how the terminal reports SHIFT.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPattern {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let bindings_list = vec![
            // Navigation
            KeyBinding::new("Up", Action::MoveUp),
            KeyBinding::new("Down", Action::MoveDown),
            KeyBinding::new("Left", Action::MoveLeft),
            KeyBinding::new("Right", Action::MoveRight),
            KeyBinding::new("k", Action::MoveUp),
            KeyBinding::new("j", Action::MoveDown),
            KeyBinding::new("h", Action::MoveLeft),
            KeyBinding::new("l", Action::MoveRight),
            KeyBinding::new("PageUp", Action::PageUp),
            KeyBinding::new("PageDown", Action::PageDown),
            KeyBinding::new("g", Action::GoToTop),
            KeyBinding::new("G", Action::GoToBottom),
            KeyBinding::new("Home", Action::GoToTop),
            KeyBinding::new("End", Action::GoToBottom),
            // Focus
            KeyBinding::new("Tab", Action::NextFocus),
            KeyBinding::new("BackTab", Action::PrevFocus),
            // Conditions
            KeyBinding::new("[", Action::PrevOption),
            KeyBinding::new("]", Action::NextOption),
            KeyBinding::new("o", Action::AddOrCondition),
            KeyBinding::new("a", Action::AddAndGroup),
            KeyBinding::new("d", Action::DeleteCondition),
            KeyBinding::new("Delete", Action::DeleteCondition),
            // Data
            KeyBinding::new("r", Action::Refresh),
            KeyBinding::new("F5", Action::Refresh),
            KeyBinding::new("e", Action::Export),
            KeyBinding::new("E", Action::ExportJson),
            KeyBinding::new("c", Action::Copy),
            // View
            KeyBinding::new("F2", Action::ToggleTheme),
            KeyBinding::new("T", Action::ToggleTheme),
            KeyBinding::new("?", Action::ToggleAbout),
            KeyBinding::new("F1", Action::ToggleAbout),
            // Application
            KeyBinding::new("q", Action::Quit),
            KeyBinding::new("Ctrl+c", Action::Quit),
            KeyBinding::new("Esc", Action::Cancel),
            KeyBinding::new("Enter", Action::Confirm),
        ];

        Self::from_list(bindings_list)
    }
}

impl KeyBindings {
    fn from_list(bindings_list: Vec<KeyBinding>) -> Self {
        let bindings_map = Self::build_map(&bindings_list);
        Self {
            bindings_list,
            bindings_map,
        }
    }

    /// Build hashmap from bindings list
    fn build_map(bindings: &[KeyBinding]) -> HashMap<KeyPattern, Action> {
        bindings
            .iter()
            .filter_map(|b| match KeyPattern::from_string(&b.key) {
                Ok(pattern) => Some((pattern, b.action)),
                Err(e) => {
                    warn!("skipping keybinding for {:?}: {e}", b.action);
                    None
                }
            })
            .collect()
    }

    /// Get action for key event
    pub fn get_action(&self, key: &KeyEvent) -> Option<Action> {
        let pattern = KeyPattern::from_event(key);
        self.bindings_map.get(&pattern).copied()
    }

    /// Defaults, overridden by `<config_dir>/keybindings.json` when it exists
    pub fn load_or_default(config_dir: &Path) -> Self {
        let path = config_dir.join(KEYBINDINGS_FILE);
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(bindings) => bindings,
            Err(e) => {
                warn!(path = %path.display(), "using default keybindings: {e}");
                Self::default()
            }
        }
    }

    /// Load from JSON config file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let bindings: KeyBindings = serde_json::from_str(&content)?;
        Ok(Self::from_list(bindings.bindings_list))
    }

    /// Save to JSON config file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get all bindings for an action (for help display)
    pub fn get_keys_for_action(&self, action: Action) -> Vec<String> {
        self.bindings_list
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key.clone())
            .collect()
    }

    /// Check for actions that don't have any keybindings
    pub fn get_unbound_actions(&self) -> Vec<(Action, &'static str)> {
        let bound_actions: HashSet<Action> = self.bindings_list.iter().map(|b| b.action).collect();

        Action::all()
            .into_iter()
            .filter(|action| !bound_actions.contains(action))
            .map(|action| (action, action.description()))
            .collect()
    }

    /// Validate bindings and return warnings
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen_keys: HashMap<String, Action> = HashMap::new();
        for binding in &self.bindings_list {
            if let Some(existing_action) = seen_keys.get(&binding.key) {
                warnings.push(format!(
                    "Duplicate key '{}': bound to both {:?} and {:?}",
                    binding.key, existing_action, binding.action
                ));
            } else {
                seen_keys.insert(binding.key.clone(), binding.action);
            }
        }

        let unbound = self.get_unbound_actions();
        if !unbound.is_empty() {
            warnings.push(format!(
                "{} action(s) have no keybindings: {}",
                unbound.len(),
                unbound
                    .iter()
                    .map(|(action, _)| format!("{:?}", action))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        for binding in &self.bindings_list {
            if KeyPattern::from_string(&binding.key).is_err() {
                warnings.push(format!(
                    "Invalid key pattern '{}' for action {:?}",
                    binding.key, binding.action
                ));
            }
        }

        warnings
    }
}

impl KeyBinding {
    pub fn new(key: &str, action: Action) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

impl KeyPattern {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }.normalized()
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::new(event.code, event.modifiers)
    }

    fn normalized(mut self) -> Self {
        match self.code {
            KeyCode::Char(_) | KeyCode::BackTab => self.modifiers.remove(KeyModifiers::SHIFT),
            _ => {}
        }
        self
    }

    /// Parse from string (e.g., "Ctrl+c", "F2", "T", "?")
    pub fn from_string(s: &str) -> Result<Self, String> {
        // "+" alone is a character, not a separator
        let parts: Vec<&str> = if s == "+" { vec![s] } else { s.split('+').collect() };

        let mut modifiers = KeyModifiers::empty();
        for part in &parts[..parts.len() - 1] {
            match part.to_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "cmd" | "command" | "super" => {
                    #[cfg(target_os = "macos")]
                    {
                        modifiers |= KeyModifiers::SUPER;
                    }
                    #[cfg(not(target_os = "macos"))]
                    {
                        modifiers |= KeyModifiers::CONTROL;
                    }
                }
                _ => return Err(format!("Unknown modifier: {}", part)),
            }
        }
        let key_part = parts[parts.len() - 1];

        let mut chars = key_part.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(ch), None) => KeyCode::Char(ch),
            _ => match key_part.to_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdown" | "pgdn" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                "tab" => KeyCode::Tab,
                "backtab" => KeyCode::BackTab,
                "enter" | "return" => KeyCode::Enter,
                "esc" | "escape" => KeyCode::Esc,
                "backspace" => KeyCode::Backspace,
                "delete" | "del" => KeyCode::Delete,
                "insert" | "ins" => KeyCode::Insert,
                "space" => KeyCode::Char(' '),
                f if f.starts_with('f') => match f[1..].parse::<u8>() {
                    Ok(n) if (1..=12).contains(&n) => KeyCode::F(n),
                    _ => return Err(format!("Invalid function key: {}", key_part)),
                },
                _ => return Err(format!("Unknown key: {}", key_part)),
            },
        };

        Ok(Self::new(code, modifiers))
    }

    /// Display as human-readable string
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }

        let key_str = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::BackTab => "Shift+Tab".to_string(),
            KeyCode::Delete => "Del".to_string(),
            KeyCode::F(n) => format!("F{}", n),
            other => format!("{:?}", other),
        };

        parts.push(key_str);
        parts.join("+")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut key = KeyEvent::new(code, modifiers);
        key.kind = KeyEventKind::Press;
        key
    }

    #[test]
    fn test_key_pattern_parsing() {
        assert!(KeyPattern::from_string("Ctrl+c").is_ok());
        assert!(KeyPattern::from_string("a").is_ok());
        assert!(KeyPattern::from_string("F2").is_ok());
        assert!(KeyPattern::from_string("Up").is_ok());
        assert!(KeyPattern::from_string("[").is_ok());
        assert!(KeyPattern::from_string("Ctrl+Alt+Delete").is_ok());
        assert!(KeyPattern::from_string("F13").is_err());
        assert!(KeyPattern::from_string("Hyper+x").is_err());
    }

    #[test]
    fn test_shifted_characters_match_either_way() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get_action(&press(KeyCode::Char('T'), KeyModifiers::SHIFT)),
            Some(Action::ToggleTheme)
        );
        assert_eq!(
            bindings.get_action(&press(KeyCode::Char('?'), KeyModifiers::NONE)),
            Some(Action::ToggleAbout)
        );
        assert_eq!(
            bindings.get_action(&press(KeyCode::Char('t'), KeyModifiers::NONE)),
            None
        );
        assert_eq!(
            bindings.get_action(&press(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Action::PrevFocus)
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let bindings = KeyBindings::default();
        assert_eq!(
            bindings.get_action(&press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(
            bindings.get_action(&press(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(Action::Copy)
        );
    }

    #[test]
    fn test_default_bindings_cover_every_action() {
        let bindings = KeyBindings::default();
        assert!(bindings.get_unbound_actions().is_empty());
        for warning in bindings.validate() {
            assert!(!warning.contains("Invalid key pattern"), "{warning}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(KeyPattern::from_string("Ctrl+c").unwrap().display(), "Ctrl+c");
        assert_eq!(KeyPattern::from_string("F2").unwrap().display(), "F2");
    }

    #[test]
    fn test_save_and_load() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(KEYBINDINGS_FILE);

        let bindings = KeyBindings::default();
        bindings.save_to_file(&path).unwrap();

        let loaded = KeyBindings::load_or_default(temp_dir.path());
        assert_eq!(bindings.bindings_list.len(), loaded.bindings_list.len());
        assert_eq!(
            loaded.get_action(&press(KeyCode::F(2), KeyModifiers::NONE)),
            Some(Action::ToggleTheme)
        );
    }
}
