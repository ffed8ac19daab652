use adw::prelude::*;
use relm4::factory::FactoryVecDeque;
use relm4::prelude::*;

use crate::services::chat::HistoryItem;

// --- ConversationRow factory component ---

#[derive(Debug)]
pub struct ConversationRow {
    item: HistoryItem,
}

#[derive(Debug)]
pub enum ConversationRowOutput {
    Delete(String),
}

#[relm4::factory(pub)]
impl FactoryComponent for ConversationRow {
    type Init = HistoryItem;
    type Input = ();
    type Output = ConversationRowOutput;
    type CommandOutput = ();
    type ParentWidget = gtk::ListBox;

    view! {
        gtk::Box {
            set_orientation: gtk::Orientation::Horizontal,
            set_spacing: 6,
            set_margin_all: 6,

            gtk::Label {
                set_label: &self.item.title,
                set_halign: gtk::Align::Start,
                set_hexpand: true,
                set_ellipsize: gtk::pango::EllipsizeMode::End,
                set_max_width_chars: 28,
            },

            gtk::Button {
                set_icon_name: "user-trash-symbolic",
                set_tooltip_text: Some("Delete chat"),
                add_css_class: "flat",
                add_css_class: "circular",
                connect_clicked[sender, id = self.item.id.clone()] => move |_| {
                    let _ = sender.output(ConversationRowOutput::Delete(id.clone()));
                },
            },
        }
    }

    fn init_model(item: Self::Init, _index: &DynamicIndex, _sender: FactorySender<Self>) -> Self {
        Self { item }
    }
}

// --- Sidebar component ---

pub struct Sidebar {
    conversations: FactoryVecDeque<ConversationRow>,
}

#[derive(Debug)]
pub enum SidebarMsg {
    SetHistory(Vec<HistoryItem>),
    NewChat,
    Activated(usize),
    Delete(String),
    ShowContextMenu(f64, f64, usize),
    Rename(usize),
    DoRename(String, String), // id, new_title
}

#[derive(Debug)]
pub enum SidebarOutput {
    NewChat,
    Selected(String),
    Delete(String),
    Rename(String, String),
}

#[relm4::component(pub)]
impl Component for Sidebar {
    type Init = ();
    type Input = SidebarMsg;
    type Output = SidebarOutput;
    type CommandOutput = ();

    view! {
        adw::ToolbarView {
            add_top_bar = &adw::HeaderBar {
                set_show_end_title_buttons: false,

                pack_start = &gtk::Button {
                    set_icon_name: "list-add-symbolic",
                    set_tooltip_text: Some("New Chat"),
                    connect_clicked => SidebarMsg::NewChat,
                },

                #[wrap(Some)]
                set_title_widget = &adw::WindowTitle {
                    set_title: "Conversations",
                },
            },

            #[wrap(Some)]
            set_content = &gtk::ScrolledWindow {
                set_hscrollbar_policy: gtk::PolicyType::Never,
                set_vexpand: true,

                #[local_ref]
                conversation_list -> gtk::ListBox {
                    set_selection_mode: gtk::SelectionMode::Single,
                    add_css_class: "navigation-sidebar",
                },
            },
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let conversations = FactoryVecDeque::builder()
            .launch(gtk::ListBox::default())
            .forward(sender.input_sender(), |output| match output {
                ConversationRowOutput::Delete(id) => SidebarMsg::Delete(id),
            });

        let model = Self { conversations };

        let conversation_list = model.conversations.widget();
        let widgets = view_output!();

        let sender_activate = sender.clone();
        conversation_list.connect_row_activated(move |_, row| {
            sender_activate.input(SidebarMsg::Activated(row.index() as usize));
        });

        let gesture = gtk::GestureClick::new();
        gesture.set_button(3);
        let list = conversation_list.clone();
        let sender_menu = sender.clone();
        gesture.connect_released(move |_, _, x, y| {
            if let Some(row) = list.row_at_y(y as i32) {
                sender_menu.input(SidebarMsg::ShowContextMenu(x, y, row.index() as usize));
            }
        });
        conversation_list.add_controller(gesture);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>, root: &Self::Root) {
        match msg {
            SidebarMsg::SetHistory(history) => {
                let active = history.iter().position(|item| item.active);
                {
                    let mut guard = self.conversations.guard();
                    guard.clear();
                    for item in history {
                        guard.push_back(item);
                    }
                }
                let list = self.conversations.widget();
                if let Some(row) = active.and_then(|i| list.row_at_index(i as i32)) {
                    list.select_row(Some(&row));
                }
            }
            SidebarMsg::NewChat => {
                let _ = sender.output(SidebarOutput::NewChat);
            }
            SidebarMsg::Activated(index) => {
                if let Some(id) = self.id_at(index) {
                    let _ = sender.output(SidebarOutput::Selected(id));
                }
            }
            SidebarMsg::Delete(id) => {
                let _ = sender.output(SidebarOutput::Delete(id));
            }
            SidebarMsg::ShowContextMenu(x, y, index) => {
                let list = self.conversations.widget();

                let menu = gio::Menu::new();
                menu.append(Some("Rename"), Some("sidebar.rename"));

                let actions = gio::SimpleActionGroup::new();
                let rename = gio::SimpleAction::new("rename", None);
                let sender_rename = sender.input_sender().clone();
                rename.connect_activate(move |_, _| {
                    sender_rename.emit(SidebarMsg::Rename(index));
                });
                actions.add_action(&rename);
                list.insert_action_group("sidebar", Some(&actions));

                let popover = gtk::PopoverMenu::from_model(Some(&menu));
                popover.set_parent(list);
                popover.set_pointing_to(Some(&gtk::gdk::Rectangle::new(x as i32, y as i32, 1, 1)));

                // Unparent after the action had a chance to run.
                let parent = list.clone();
                popover.connect_closed(move |p| {
                    let popover = p.clone();
                    let parent = parent.clone();
                    glib::idle_add_local_once(move || {
                        popover.unparent();
                        parent.insert_action_group("sidebar", None::<&gio::SimpleActionGroup>);
                    });
                });
                popover.popup();
            }
            SidebarMsg::Rename(index) => {
                let Some((id, title)) = self
                    .conversations
                    .get(index)
                    .map(|row| (row.item.id.clone(), row.item.title.clone()))
                else {
                    return;
                };

                let dialog = adw::AlertDialog::builder()
                    .heading("Rename Conversation")
                    .body("Enter a new name:")
                    .build();
                let entry = gtk::Entry::builder()
                    .text(&title)
                    .activates_default(true)
                    .build();
                dialog.set_extra_child(Some(&entry));
                dialog.add_response("cancel", "Cancel");
                dialog.add_response("rename", "Rename");
                dialog.set_response_appearance("rename", adw::ResponseAppearance::Suggested);
                dialog.set_default_response(Some("rename"));
                dialog.set_close_response("cancel");

                let sender_dialog = sender.input_sender().clone();
                dialog.connect_response(None, move |_, response| {
                    if response == "rename" {
                        sender_dialog.emit(SidebarMsg::DoRename(id.clone(), entry.text().to_string()));
                    }
                });

                if let Some(window) = root.root().and_then(|r| r.downcast::<gtk::Window>().ok()) {
                    dialog.present(Some(&window));
                }
            }
            SidebarMsg::DoRename(id, title) => {
                let _ = sender.output(SidebarOutput::Rename(id, title));
            }
        }
    }
}

impl Sidebar {
    fn id_at(&self, index: usize) -> Option<String> {
        self.conversations.get(index).map(|row| row.item.id.clone())
    }
}
