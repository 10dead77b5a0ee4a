//! Display modes selected in the configuration.

use std::fmt;
use std::str::FromStr;

/// One display mode tag from `main.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Normal,
    Desktop,
    Screensize,
    Fullscreen,
    Maximize,
    KeepBelow,
    SkipTaskbar,
    SkipPager,
}

impl WindowState {
    pub const ALL: [WindowState; 8] = [
        WindowState::Normal,
        WindowState::Desktop,
        WindowState::Screensize,
        WindowState::Fullscreen,
        WindowState::Maximize,
        WindowState::KeepBelow,
        WindowState::SkipTaskbar,
        WindowState::SkipPager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Desktop => "desktop",
            Self::Screensize => "screensize",
            Self::Fullscreen => "fullscreen",
            Self::Maximize => "maximize",
            Self::KeepBelow => "keep_below",
            Self::SkipTaskbar => "skip_taskbar",
            Self::SkipPager => "skip_pager",
        }
    }
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|state| state.as_str() == s)
            .copied()
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(WindowState::as_str).collect();
                format!(
                    "unknown window state '{s}', expected one of: {}",
                    valid.join(", ")
                )
            })
    }
}

/// Terminal behaviour derived from a list of [`WindowState`]s.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowHints {
    /// Take over the whole terminal instead of an inline strip
    pub fullscreen: bool,
    /// Draw bars at half the drawable height
    pub halve_height: bool,
    /// Requested states a terminal cannot honour
    pub keep_below: bool,
    pub skip_taskbar: bool,
    pub skip_pager: bool,
}

impl WindowHints {
    pub fn from_states(states: &[WindowState]) -> Self {
        let mut hints = Self::default();
        for state in states {
            hints.apply(*state);
        }
        hints
    }

    fn apply(&mut self, state: WindowState) {
        match state {
            WindowState::Normal => {}
            WindowState::Desktop => {
                self.fullscreen = true;
                self.halve_height = true;
            }
            WindowState::Screensize | WindowState::Fullscreen | WindowState::Maximize => {
                self.fullscreen = true;
            }
            WindowState::KeepBelow => self.keep_below = true,
            WindowState::SkipTaskbar => self.skip_taskbar = true,
            WindowState::SkipPager => self.skip_pager = true,
        }
    }

    /// Names of requested states that have no effect in a terminal.
    pub fn unsupported(&self) -> Vec<&'static str> {
        [
            (self.keep_below, WindowState::KeepBelow),
            (self.skip_taskbar, WindowState::SkipTaskbar),
            (self.skip_pager, WindowState::SkipPager),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .map(|(_, state)| state.as_str())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_tags() {
        for state in WindowState::ALL {
            assert_eq!(state.as_str().parse::<WindowState>(), Ok(state));
        }
        assert!("Fullscreen".parse::<WindowState>().is_err());
        assert!("".parse::<WindowState>().is_err());
    }

    #[test]
    fn test_normal_stays_inline() {
        let hints = WindowHints::from_states(&[WindowState::Normal]);
        assert_eq!(hints, WindowHints::default());
    }

    #[test]
    fn test_desktop_halves_height() {
        let hints = WindowHints::from_states(&[WindowState::Desktop]);
        assert!(hints.fullscreen);
        assert!(hints.halve_height);
    }

    #[test]
    fn test_fullscreen_variants() {
        for state in [
            WindowState::Screensize,
            WindowState::Fullscreen,
            WindowState::Maximize,
        ] {
            let hints = WindowHints::from_states(&[WindowState::Normal, state]);
            assert!(hints.fullscreen);
            assert!(!hints.halve_height);
        }
    }

    #[test]
    fn test_unsupported_states_are_reported() {
        let hints = WindowHints::from_states(&[
            WindowState::KeepBelow,
            WindowState::Fullscreen,
            WindowState::SkipPager,
        ]);
        assert_eq!(hints.unsupported(), vec!["keep_below", "skip_pager"]);
    }
}
