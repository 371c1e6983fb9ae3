//! Core library for `ozmon`: configuration, templates, sessions and the
//! monitor binary lifecycle.

pub mod config;
pub mod config_types;
pub mod error;
pub mod installer;
pub mod monitor;
pub mod presets;
pub mod process;
pub mod session;
pub mod stellar;
pub mod templates;

pub use config::AppConfig;
pub use config::HomeLayout;
pub use config::find_ozmon_home;
pub use config_types::NotificationChannel;
pub use config_types::NotificationKind;
pub use config_types::UserConfig;
pub use error::MonitorErr;
pub use error::Result;
pub use presets::NETWORK_PRESETS;
pub use presets::NetworkKind;
pub use presets::NetworkPreset;
pub use session::SessionId;
pub use session::SessionInfo;
pub use session::SessionLiveness;
pub use session::SessionManager;
pub use session::SessionRegistry;
pub use session::SessionStatus;
pub use templates::TemplateStore;
