//! Log macros for cache, fetch and mutation activity.
//!
//! Everything compiles away without the `tracing` feature. With `plain-logs` the
//! category markers are printed without their emoji:
//!
//! ```toml
//! storefront-provider = { version = "0.1", features = ["plain-logs"] }
//! ```
//!
//! Categories: `CACHE-HIT`, `CACHE-STORE`, `CACHE-INVALIDATE`, `STALE-RESPONSE`,
//! `MUTATION`, `MUTATION-SUCCESS`, `MUTATION-ERROR`.

/// Debug event tagged with a category marker
#[doc(hidden)]
#[macro_export]
macro_rules! log_category {
    ($emoji:literal, $category:literal, $($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::debug!("{} [{}] {}", $emoji, $category, format!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::debug!("[{}] {}", $category, format!($($arg)*));
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)*);
    };
}

/// A subscriber was served a cached entry without a request
#[doc(hidden)]
#[macro_export]
macro_rules! log_cache_hit {
    ($($arg:tt)*) => { $crate::log_category!("📊", "CACHE-HIT", $($arg)*); };
}

/// A fetch result was applied to its entry
#[doc(hidden)]
#[macro_export]
macro_rules! log_cache_store {
    ($($arg:tt)*) => { $crate::log_category!("💾", "CACHE-STORE", $($arg)*); };
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_cache_invalidate {
    ($($arg:tt)*) => { $crate::log_category!("🗑️", "CACHE-INVALIDATE", $($arg)*); };
}

/// A response arrived after a newer request for the same key was issued
#[doc(hidden)]
#[macro_export]
macro_rules! log_stale_response {
    ($($arg:tt)*) => { $crate::log_category!("⏭️", "STALE-RESPONSE", $($arg)*); };
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_mutation_start {
    ($($arg:tt)*) => { $crate::log_category!("🔄", "MUTATION", $($arg)*); };
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_mutation_success {
    ($($arg:tt)*) => { $crate::log_category!("✅", "MUTATION-SUCCESS", $($arg)*); };
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_mutation_error {
    ($($arg:tt)*) => { $crate::log_category!("❌", "MUTATION-ERROR", $($arg)*); };
}
