pub mod normalize;
pub mod directory;
pub mod cache;
pub mod identity;
pub mod config;
pub mod error;
pub mod server;

// Login trace on stderr in tests and debug builds, e.g. which match tier resolved a username.
// Usage: tprintln!("auth.resolve user={:?}", username);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( eprintln!($($arg)*) );
}

// In non-test builds, provide a no-op tprintln! so calls compile without effect.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        // Arguments still type-check in release; nothing is printed
        if false { let _ = format!($($arg)*); }
    });
}
