//! Small shared utilities.

use uuid::Uuid;

/// Generates a fresh version-4 [`Uuid`].
///
/// Every vertex and full cell receives one at allocation time. The ids play
/// no role in any algorithm; they identify elements in diagnostics and give
/// serialization round-trip tests a pool-order-independent handle on
/// elements.
#[must_use]
pub fn make_uuid() -> Uuid {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_uuid_is_unique_and_v4() {
        let a = make_uuid();
        let b = make_uuid();
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 4);
    }
}
