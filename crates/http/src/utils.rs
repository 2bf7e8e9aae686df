//! Internal helper macros shared by the codec engines.

/// Returns early with the given error when the predicate does not hold.
///
/// Works like `assert!`, but for fallible functions returning `Result`.
///
/// ```ignore
/// ensure!(fields < limits.max_fields, ParseError::too_many_headers(limits.max_fields));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
