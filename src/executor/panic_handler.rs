use super::task::TaskError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, converting an unwinding panic into [`TaskError::Panicked`].
pub(crate) fn isolate<F>(f: F) -> Result<(), TaskError>
where
    F: FnOnce() -> Result<(), TaskError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolate_success() {
        assert_eq!(isolate(|| Ok(())), Ok(()));
    }

    #[test]
    fn test_isolate_passes_errors_through() {
        let result = isolate(|| Err(TaskError::Failed("bad input".into())));
        assert_eq!(result, Err(TaskError::Failed("bad input".into())));
    }

    #[test]
    fn test_isolate_formatted_panic() {
        let result = isolate(|| panic!("index {} out of range", 7));
        assert_eq!(
            result,
            Err(TaskError::Panicked("index 7 out of range".into()))
        );
    }

    #[test]
    fn test_unknown_payload() {
        let result = isolate(|| std::panic::panic_any(42u32));
        assert_eq!(result, Err(TaskError::Panicked("Unknown panic".into())));
    }
}
