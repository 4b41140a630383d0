use log::warn;

/// Log a warning when a value that a color object requires is missing.
pub(crate) trait OptionLog {
    fn warn_none(self, message: &str) -> Self;
}

impl<T> OptionLog for Option<T> {
    #[inline]
    fn warn_none(self, message: &str) -> Self {
        self.or_else(|| {
            warn!("{message}");

            None
        })
    }
}
