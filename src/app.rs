use std::sync::Arc;

use adw::prelude::*;
use relm4::factory::FactoryVecDeque;
use relm4::prelude::*;

use crate::config;
use crate::providers::{ProviderError, TextGenerator};
use crate::services::chat::PendingRequest;
use crate::services::settings::Theme;
use crate::services::{ChatView, Database, MarkdownRenderer, SessionStore, SettingsService};
use crate::ui::message_row::MessageRow;
use crate::ui::sidebar::{Sidebar, SidebarMsg, SidebarOutput};
use crate::ui::window::{apply_theme, create_shortcuts_window, is_send_key, theme_toggle_icon};

pub struct AppInit {
    pub database: Database,
    pub generator: Arc<dyn TextGenerator>,
}

pub struct App {
    chat: ChatView<Database, MarkdownRenderer>,
    settings_store: Database,
    generator: Arc<dyn TextGenerator>,
    theme: Theme,
    sidebar: Controller<Sidebar>,
    messages: FactoryVecDeque<MessageRow>,
    input: gtk::TextBuffer,
    input_empty: bool,
    scroller: gtk::ScrolledWindow,
    toast_overlay: adw::ToastOverlay,
}

#[derive(Debug)]
pub enum AppMsg {
    NewChat,
    Select(String),
    Delete(String),
    Rename(String, String),
    Send,
    InputChanged,
    ToggleTheme,
    ShowShortcuts,
}

#[derive(Debug)]
pub enum AppCmd {
    Generated {
        request: PendingRequest,
        outcome: Result<String, ProviderError>,
    },
}

#[relm4::component(pub)]
impl Component for App {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();
    type CommandOutput = AppCmd;

    view! {
        adw::ApplicationWindow {
            set_title: Some(config::APP_NAME),
            set_default_width: 1000,
            set_default_height: 720,
            set_width_request: 360,
            set_height_request: 480,

            #[local_ref]
            toast_overlay -> adw::ToastOverlay {
                #[wrap(Some)]
                set_child = &adw::NavigationSplitView {
                    set_min_sidebar_width: 200.0,
                    set_max_sidebar_width: 300.0,

                    #[wrap(Some)]
                    set_sidebar = &adw::NavigationPage {
                        set_title: "Conversations",
                        set_tag: Some("sidebar"),
                        set_child: Some(model.sidebar.widget()),
                    },

                    #[wrap(Some)]
                    set_content = &adw::NavigationPage {
                        set_title: config::APP_NAME,
                        set_tag: Some("content"),

                        #[wrap(Some)]
                        set_child = &adw::ToolbarView {
                            add_top_bar = &adw::HeaderBar {
                                pack_end = &gtk::Button {
                                    #[watch]
                                    set_icon_name: theme_toggle_icon(model.theme),
                                    set_tooltip_text: Some("Toggle theme"),
                                    connect_clicked => AppMsg::ToggleTheme,
                                },
                            },

                            #[wrap(Some)]
                            set_content = &gtk::Box {
                                set_orientation: gtk::Orientation::Vertical,

                                gtk::Stack {
                                    set_vexpand: true,
                                    set_transition_type: gtk::StackTransitionType::Crossfade,

                                    add_named[Some("welcome")] = &adw::StatusPage {
                                        set_icon_name: Some("chat-symbolic"),
                                        set_title: "Welcome to Nexora",
                                        set_description: Some("Ask me anything about data structures and algorithms."),
                                    },

                                    add_named: (&model.scroller, Some("chat")),

                                    #[watch]
                                    set_visible_child_name: if model.chat.show_welcome() { "welcome" } else { "chat" },
                                },

                                gtk::Separator {},

                                gtk::Box {
                                    set_orientation: gtk::Orientation::Horizontal,
                                    set_spacing: 6,
                                    set_margin_all: 12,

                                    gtk::Overlay {
                                        set_hexpand: true,

                                        gtk::ScrolledWindow {
                                            set_hexpand: true,
                                            set_max_content_height: 150,
                                            set_propagate_natural_height: true,
                                            set_min_content_height: 40,

                                            #[name = "text_view"]
                                            gtk::TextView {
                                                set_wrap_mode: gtk::WrapMode::WordChar,
                                                set_accepts_tab: false,
                                                set_top_margin: 8,
                                                set_bottom_margin: 8,
                                                set_left_margin: 8,
                                                set_right_margin: 8,
                                                set_buffer: Some(&model.input),
                                                #[watch]
                                                set_sensitive: !model.chat.is_busy(),
                                            },
                                        },

                                        add_overlay = &gtk::Label {
                                            set_label: "Ask Nexora about data structures and algorithms...",
                                            set_halign: gtk::Align::Start,
                                            set_valign: gtk::Align::Start,
                                            set_margin_start: 8,
                                            set_margin_top: 8,
                                            set_can_target: false,
                                            add_css_class: "dim-label",
                                            #[watch]
                                            set_visible: model.input_empty,
                                        },
                                    },

                                    gtk::Button {
                                        set_icon_name: "go-up-symbolic",
                                        set_tooltip_text: Some("Send message (Enter)"),
                                        set_valign: gtk::Align::End,
                                        add_css_class: "suggested-action",
                                        add_css_class: "circular",
                                        #[watch]
                                        set_sensitive: !model.chat.is_busy(),
                                        connect_clicked => AppMsg::Send,
                                    },
                                },
                            },
                        },
                    },
                },
            },
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let sidebar = Sidebar::builder()
            .launch(())
            .forward(sender.input_sender(), |output| match output {
                SidebarOutput::NewChat => AppMsg::NewChat,
                SidebarOutput::Selected(id) => AppMsg::Select(id),
                SidebarOutput::Delete(id) => AppMsg::Delete(id),
                SidebarOutput::Rename(id, title) => AppMsg::Rename(id, title),
            });

        let messages = FactoryVecDeque::builder()
            .launch(gtk::Box::default())
            .detach();

        let theme = SettingsService::load_theme(&init.database);
        apply_theme(theme);

        let store = SessionStore::open(init.database.clone());
        let mut model = App {
            chat: ChatView::new(store, MarkdownRenderer),
            settings_store: init.database,
            generator: init.generator,
            theme,
            sidebar,
            messages,
            input: gtk::TextBuffer::new(None::<&gtk::TextTagTable>),
            input_empty: true,
            scroller: gtk::ScrolledWindow::new(),
            toast_overlay: adw::ToastOverlay::new(),
        };

        let message_list = model.messages.widget();
        message_list.set_orientation(gtk::Orientation::Vertical);
        message_list.set_spacing(4);
        message_list.set_margin_top(12);
        message_list.set_margin_bottom(12);
        model.scroller.set_hscrollbar_policy(gtk::PolicyType::Never);
        model.scroller.set_child(Some(message_list));

        let toast_overlay = model.toast_overlay.clone();
        let widgets = view_output!();

        // Enter sends, Shift+Enter inserts a newline.
        let sender_key = sender.input_sender().clone();
        let key_controller = gtk::EventControllerKey::new();
        key_controller.connect_key_pressed(move |_, key, _code, modifier| {
            if is_send_key(key, modifier) {
                sender_key.emit(AppMsg::Send);
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });
        widgets.text_view.add_controller(key_controller);

        let sender_buf = sender.input_sender().clone();
        model.input.connect_changed(move |_| {
            sender_buf.emit(AppMsg::InputChanged);
        });

        let app = relm4::main_adw_application();

        let new_chat_action = gio::SimpleAction::new("new-chat", None);
        let sender_new = sender.input_sender().clone();
        new_chat_action.connect_activate(move |_, _| {
            sender_new.emit(AppMsg::NewChat);
        });
        app.add_action(&new_chat_action);
        app.set_accels_for_action("app.new-chat", &["<Control>n"]);

        let shortcuts_action = gio::SimpleAction::new("show-shortcuts", None);
        let sender_shortcuts = sender.input_sender().clone();
        shortcuts_action.connect_activate(move |_, _| {
            sender_shortcuts.emit(AppMsg::ShowShortcuts);
        });
        app.add_action(&shortcuts_action);
        app.set_accels_for_action("app.show-shortcuts", &["<Control>slash"]);

        model.refresh();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, root: &Self::Root) {
        match msg {
            AppMsg::NewChat => {
                self.chat.new_chat();
            }
            AppMsg::Select(id) => {
                if id == self.chat.store().active_id() {
                    return;
                }
                if let Err(e) = self.chat.switch_chat(&id) {
                    tracing::warn!("Failed to switch conversation: {}", e);
                }
            }
            AppMsg::Delete(id) => {
                if let Err(e) = self.chat.delete_chat(&id) {
                    tracing::warn!("Failed to delete conversation: {}", e);
                }
            }
            AppMsg::Rename(id, title) => {
                if let Err(e) = self.chat.rename_chat(&id, &title) {
                    self.show_toast(&e.to_string());
                }
            }
            AppMsg::Send => {
                let text = self
                    .input
                    .text(&self.input.start_iter(), &self.input.end_iter(), false)
                    .to_string();
                self.chat.set_input(text.clone());
                if let Some(request) = self.chat.begin_send(&text) {
                    let generator = self.generator.clone();
                    sender.command(move |out, _| {
                        Box::pin(async move {
                            let outcome = generator.generate(&request.prompt).await;
                            let _ = out.send(AppCmd::Generated { request, outcome });
                        })
                    });
                }
            }
            AppMsg::ToggleTheme => match SettingsService::toggle_theme(&self.settings_store) {
                Ok(theme) => {
                    self.theme = theme;
                    apply_theme(theme);
                }
                Err(e) => {
                    tracing::error!("Failed to save theme: {}", e);
                    self.theme = self.theme.toggled();
                    apply_theme(self.theme);
                }
            },
            AppMsg::InputChanged => {
                self.input_empty = self.input.char_count() == 0;
                return;
            }
            AppMsg::ShowShortcuts => {
                create_shortcuts_window(root);
                return;
            }
        }
        self.refresh();
    }

    fn update_cmd(
        &mut self,
        msg: Self::CommandOutput,
        _sender: ComponentSender<Self>,
        _root: &Self::Root,
    ) {
        match msg {
            AppCmd::Generated { request, outcome } => {
                self.chat.finish_send(request, outcome);
                if self.chat.input().is_empty() {
                    self.input.set_text("");
                }
            }
        }
        self.refresh();
    }
}

impl App {
    /// Push the chat state into the sidebar and message list.
    fn refresh(&mut self) {
        self.sidebar.emit(SidebarMsg::SetHistory(self.chat.history()));

        {
            let mut guard = self.messages.guard();
            guard.clear();
            for entry in self.chat.log() {
                guard.push_back(entry.clone());
            }
        }

        if self.chat.scroll_target().is_some() {
            let adjustment = self.scroller.vadjustment();
            glib::idle_add_local_once(move || {
                adjustment.set_value(adjustment.upper() - adjustment.page_size());
            });
        }
    }

    fn show_toast(&self, message: &str) {
        let toast = adw::Toast::new(message);
        toast.set_timeout(3);
        self.toast_overlay.add_toast(toast);
    }
}
