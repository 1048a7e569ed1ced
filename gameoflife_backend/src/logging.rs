//! Leveled logging over the canister debug log.
//!
//! Native builds (unit and integration tests) have no IC system API, so the
//! same lines go to stderr there.

use std::fmt;

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::emit("INFO", format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logging::emit("WARN", format_args!($($arg)*))
    };
}

pub fn emit(level: &str, args: fmt::Arguments<'_>) {
    #[cfg(target_arch = "wasm32")]
    ic_cdk::println!("[{}] {}", level, args);

    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("[{}] {}", level, args);
}
