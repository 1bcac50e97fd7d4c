//! Process-wide interning for short decoded strings.
//!
//! ABC files repeat local names, namespace names, and type names constantly
//! (every reference to `flash.display.Sprite` re-encodes the same string).
//! Interning short strings lets later phases and downstream consumers compare
//! them by pointer instead of by byte content. Only strings of length <= 30
//! bytes are interned; longer strings are rare and not worth holding onto
//! forever in a process-wide table.

use dashmap::DashSet;
use once_cell::sync::Lazy;
use std::sync::Arc;

const MAX_INTERNED_LEN: usize = 30;

static TABLE: Lazy<DashSet<Arc<str>>> = Lazy::new(DashSet::new);

/// Canonicalize `s` through the process-wide intern table if it's short
/// enough, otherwise return it as a fresh `Arc<str>`.
///
/// Concurrent insertion is idempotent: two threads interning the same string
/// at once both get the same canonical `Arc<str>` back, modulo which one
/// "wins" the race to insert (the loser's allocation is simply dropped).
pub fn intern(s: &str) -> Arc<str> {
    if s.len() > MAX_INTERNED_LEN {
        return Arc::from(s);
    }
    if let Some(existing) = TABLE.get(s) {
        return existing.clone();
    }
    let arc: Arc<str> = Arc::from(s);
    TABLE.insert(arc.clone());
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interns_equal_short_strings_to_the_same_pointer() {
        let a = intern("flash.display.Sprite");
        let b = intern("flash.display.Sprite");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn does_not_intern_long_strings() {
        let long = "x".repeat(MAX_INTERNED_LEN + 1);
        let a = intern(&long);
        let b = intern(&long);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn empty_string_interns_fine() {
        let a = intern("");
        let b = intern("");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
