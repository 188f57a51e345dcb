/// Emit a `tracing` debug event only when the given debug flag is set.
///
/// Every client carries the flag resolved from its `*_DEBUG` variable; the
/// event still goes through whatever subscriber the caller installed.
#[macro_export]
macro_rules! log_debug {
    ($enabled:expr, $($arg:tt)*) => {
        if $enabled {
            $crate::__tracing::debug!($($arg)*);
        }
    };
}
