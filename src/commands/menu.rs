//! Interactive menu
//!
//! Transports that support buttons render [`MENU`] as one button per entry
//! and send the entry's callback data back when it is pressed. Text-only
//! transports can show [`render_menu`] and accept the callback data as a
//! plain request.

/// A menu button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ShowUsers,
    AddUser,
    DeleteUser,
    EditBudget,
    Start,
}

pub const MENU_PROMPT: &str = "Please choose:";

/// Buttons in display order
pub const MENU: [MenuAction; 5] = [
    MenuAction::ShowUsers,
    MenuAction::AddUser,
    MenuAction::DeleteUser,
    MenuAction::EditBudget,
    MenuAction::Start,
];

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::ShowUsers => "Show Users",
            MenuAction::AddUser => "Add User",
            MenuAction::DeleteUser => "Delete User",
            MenuAction::EditBudget => "Edit User Budget",
            MenuAction::Start => "Start",
        }
    }

    pub fn callback_data(&self) -> &'static str {
        match self {
            MenuAction::ShowUsers => "show_users",
            MenuAction::AddUser => "add_user",
            MenuAction::DeleteUser => "delete_user",
            MenuAction::EditBudget => "edit_budget",
            MenuAction::Start => "start",
        }
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        MENU.into_iter()
            .find(|action| action.callback_data() == data)
    }

    /// Instructions shown for buttons that need arguments
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            MenuAction::AddUser => Some("Use /adduser <user_id> <budget> to add a user."),
            MenuAction::DeleteUser => Some("Use /deleteuser <user_id> to delete a user."),
            MenuAction::EditBudget => {
                Some("Use /editbudget <user_id> <new_budget> to edit a user's budget.")
            }
            MenuAction::ShowUsers | MenuAction::Start => None,
        }
    }
}

/// Text rendering of the menu, one `[label] callback` line per button
pub fn render_menu() -> String {
    let mut out = String::from(MENU_PROMPT);
    for action in MENU {
        out.push_str(&format!("\n[{}] {}", action.label(), action.callback_data()));
    }
    out
}
