use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 覆盖在主界面之上的页面，同一时间最多打开一个。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Screen {
    Rules,
    Settings,
    About,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ThemeSetting {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PrimaryColor {
    #[default]
    Purple,
    Red,
    Green,
    Blue,
    DarkYellow,
    DarkGray,
}

impl FromStr for Screen {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rules" | "how_to_play" => Ok(Screen::Rules),
            "settings" => Ok(Screen::Settings),
            "about" => Ok(Screen::About),
            _ => Err(()),
        }
    }
}

impl FromStr for ThemeSetting {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeSetting::Light),
            "dark" => Ok(ThemeSetting::Dark),
            "system" => Ok(ThemeSetting::System),
            _ => Err(()),
        }
    }
}

impl FromStr for PrimaryColor {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "purple" => Ok(PrimaryColor::Purple),
            "red" => Ok(PrimaryColor::Red),
            "green" => Ok(PrimaryColor::Green),
            "blue" => Ok(PrimaryColor::Blue),
            "dark_yellow" | "darkyellow" => Ok(PrimaryColor::DarkYellow),
            "dark_gray" | "darkgray" | "dark_grey" => Ok(PrimaryColor::DarkGray),
            _ => Err(()),
        }
    }
}

/// 界面层的开关状态，与对局快照分开保存。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewState {
    #[serde(default)]
    pub add_round_dialog_open: bool,
    #[serde(default)]
    pub cancel_game_dialog_open: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Screen>,
    #[serde(default)]
    pub theme: ThemeSetting,
    #[serde(default)]
    pub primary_color: PrimaryColor,
}

impl ViewState {
    pub fn open_screen(&mut self, screen: Screen) {
        self.overlay = Some(screen);
    }

    pub fn close_screen(&mut self, screen: Screen) {
        if self.overlay == Some(screen) {
            self.overlay = None;
        }
    }

    pub fn close_overlays(&mut self) {
        self.overlay = None;
    }

    pub fn is_open(&self, screen: Screen) -> bool {
        self.overlay == Some(screen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_a_screen_replaces_the_previous_one() {
        let mut view = ViewState::default();
        view.open_screen(Screen::Rules);
        view.open_screen(Screen::About);
        assert!(view.is_open(Screen::About));
        assert!(!view.is_open(Screen::Rules));

        view.close_screen(Screen::Rules);
        assert!(view.is_open(Screen::About), "closing another screen is a no-op");
        view.close_screen(Screen::About);
        assert_eq!(view.overlay, None);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("Settings".parse::<Screen>(), Ok(Screen::Settings));
        assert_eq!("DARK".parse::<ThemeSetting>(), Ok(ThemeSetting::Dark));
        assert_eq!("dark-yellow".parse::<PrimaryColor>(), Ok(PrimaryColor::DarkYellow));
        assert_eq!("Dark Gray".parse::<PrimaryColor>(), Ok(PrimaryColor::DarkGray));
        assert!("magenta".parse::<PrimaryColor>().is_err());
    }

    #[test]
    fn defaults_match_fresh_install() {
        let view = ViewState::default();
        assert_eq!(view.theme, ThemeSetting::System);
        assert_eq!(view.primary_color, PrimaryColor::Purple);
        assert!(!view.add_round_dialog_open);
        assert!(!view.cancel_game_dialog_open);
    }
}
