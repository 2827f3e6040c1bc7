// Dashboard widgets.

pub mod board;
pub mod help_bar;
pub mod quit_confirm;
pub mod status_bar;
