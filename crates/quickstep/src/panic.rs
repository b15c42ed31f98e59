//! Panic payload formatting.

use std::any::Any;

/// Render a panic payload as text.
///
/// `&str` and `String` payloads are returned as-is; common numeric payloads
/// are formatted with `Display`. Anything else falls back to `Debug`, which
/// for `dyn Any` only names the type.
///
/// # Examples
///
/// ```
/// use quickstep::panic_message;
/// use std::any::Any;
///
/// let payload: Box<dyn Any + Send> = Box::new(String::from("boom"));
/// assert_eq!(panic_message(payload.as_ref()), "boom");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .or_else(|| payload.downcast_ref::<i32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<i64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u32>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<u64>().map(ToString::to_string))
        .or_else(|| payload.downcast_ref::<usize>().map(ToString::to_string))
        .unwrap_or_else(|| format!("{payload:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Box::new("static str"), "static str")]
    #[case(Box::new(String::from("owned")), "owned")]
    #[case(Box::new(42_u32), "42")]
    #[case(Box::new(-3_i64), "-3")]
    fn formats_common_payloads(#[case] payload: Box<dyn Any + Send>, #[case] expected: &str) {
        assert_eq!(panic_message(payload.as_ref()), expected);
    }

    #[test]
    fn falls_back_to_debug() {
        let payload: Box<dyn Any + Send> = Box::new(vec![1_u8]);
        assert_eq!(panic_message(payload.as_ref()), "Any { .. }");
    }
}
