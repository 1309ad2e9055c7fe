#[cfg(test)]
mod tests {
    use structpack_macros::test_traced;
    use tracing::{debug, error, info, trace};

    #[test_traced(level = "INFO")]
    fn test_info_level() {
        info!("This is an info log");
        debug!("This is a debug log (won't be shown)");
        assert_eq!(2 + 2, 4);
    }

    #[test_traced]
    fn test_default_level() {
        debug!("This is a debug log");
        trace!("This is a trace log (won't be shown)");
        assert_eq!(3 * 3, 9);
    }

    #[test_traced(level = "error")]
    fn test_lowercase_level() {
        error!("This is an error log");
        assert_eq!(5 * 2, 10);
    }

    #[test_traced(level = "TRACE")]
    #[should_panic(expected = "kept attribute")]
    fn test_keeps_attributes() {
        trace!("This is a trace log");
        panic!("kept attribute");
    }

    #[test_traced]
    fn test_result() -> Result<(), String> {
        Ok(())
    }
}
