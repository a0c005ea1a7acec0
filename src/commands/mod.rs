//! # Command Handlers
//!
//! Organized command handlers for the nutrictl CLI application. Each
//! command type lives in a dedicated submodule.
//!
//! ## Structure
//!
//! - `player` - Player management commands (list, get, create, update, delete, stats)
//! - `meal_plan` - Meal-plan commands, including template instantiation
//! - `template` - Template management commands
//! - `mode` - Serving-mode inspection and control, recorded-error listing
//! - `shared` - Shared validation, payload parsing, and envelope unwrapping
//! - `errors` - User-facing error extraction via the handled crate

pub mod errors;
pub mod meal_plan;
pub mod mode;
pub mod player;
pub mod shared;
pub mod template;

pub use meal_plan::handle_mealplan_command;
pub use mode::handle_mode_command;
pub use player::handle_player_command;
pub use template::handle_template_command;
