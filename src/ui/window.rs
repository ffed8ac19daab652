use adw::prelude::*;

use crate::services::settings::Theme;

pub fn apply_theme(theme: Theme) {
    adw::StyleManager::default().set_color_scheme(match theme {
        Theme::Light => adw::ColorScheme::ForceLight,
        Theme::Dark => adw::ColorScheme::ForceDark,
    });
}

/// Icon for the header button, showing the theme a click switches to.
pub fn theme_toggle_icon(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "weather-clear-night-symbolic",
        Theme::Dark => "weather-clear-symbolic",
    }
}

/// Enter sends the prompt; Shift+Enter falls through and inserts a newline.
pub fn is_send_key(key: gtk::gdk::Key, modifier: gtk::gdk::ModifierType) -> bool {
    key == gtk::gdk::Key::Return && !modifier.contains(gtk::gdk::ModifierType::SHIFT_MASK)
}

pub fn create_shortcuts_window(parent: &adw::ApplicationWindow) {
    let window = gtk::ShortcutsWindow::builder()
        .transient_for(parent)
        .modal(true)
        .build();

    let group = gtk::ShortcutsGroup::builder().title("Chat").build();
    for (title, accelerator) in [
        ("New chat", "<Control>n"),
        ("Send message", "Return"),
        ("New line", "<Shift>Return"),
        ("Keyboard shortcuts", "<Control>slash"),
    ] {
        let shortcut = gtk::ShortcutsShortcut::builder()
            .title(title)
            .accelerator(accelerator)
            .build();
        group.add_shortcut(&shortcut);
    }

    let section = gtk::ShortcutsSection::builder().build();
    section.add_group(&group);
    window.add_section(&section);

    window.present();
}

#[cfg(test)]
mod tests {
    use gtk::gdk::{Key, ModifierType};

    use super::*;

    #[test]
    fn test_enter_sends_and_shift_enter_does_not() {
        assert!(is_send_key(Key::Return, ModifierType::empty()));
        assert!(is_send_key(Key::Return, ModifierType::CONTROL_MASK));
        assert!(!is_send_key(Key::Return, ModifierType::SHIFT_MASK));
        assert!(!is_send_key(Key::a, ModifierType::empty()));
    }
}
