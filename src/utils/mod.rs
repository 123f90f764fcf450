pub mod constants;
pub mod string_utils;

pub use constants::*;
pub use string_utils::{format_hms, safe_truncate_chars};
