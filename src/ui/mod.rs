mod dashboard;
mod help;
mod log_panel;
mod login;
mod theme;

pub use dashboard::render_dashboard;
pub use help::render_help;
pub use log_panel::render_log_panel;
pub use login::render_login;
