pub mod detect;
pub mod error;
pub mod key_level;
pub mod store;

pub use detect::{DetectParams, Detection, Rejection, detect_levels};
pub use error::DetectError;
pub use key_level::KeyLevel;
pub use store::{InsertOutcome, LevelStore};
