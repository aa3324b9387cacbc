pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod printer;
pub mod state;

pub use commands::Command;
pub use config::Config;
pub use driver::Driver;
pub use error::{AppError, AppResult};
pub use printer::ReplyPrinter;
pub use state::AppState;
