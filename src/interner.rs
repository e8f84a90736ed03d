//! Token-type interning (§4.1): maps each distinct `TokenKind` observed across
//! all submissions to a dense, stable integer value. `FileEnd` is always 0.

use crate::token::TokenKind;
use ahash::AHashMap;
use parking_lot::RwLock;

/// Dense integer a token type is assigned on first sight. Never reassigned.
pub type TokenValue = i32;

/// Thread-safe, insert-only interner. Growth is serialized through a single
/// write lock; once a type is known, lookups only need a read lock, so
/// concurrent queries on previously-seen types never contend with each other.
pub struct TokenTypeInterner {
    state: RwLock<InternerState>,
}

struct InternerState {
    values: AHashMap<TokenKind, TokenValue>,
    next: TokenValue,
}

impl TokenTypeInterner {
    pub fn new() -> Self {
        let mut values = AHashMap::default();
        values.insert(TokenKind::FileEnd, 0);
        TokenTypeInterner { state: RwLock::new(InternerState { values, next: 1 }) }
    }

    /// Returns the dense value for `kind`, assigning a fresh one if this is
    /// the first time this interner has seen it.
    pub fn value_of(&self, kind: TokenKind) -> TokenValue {
        if kind == TokenKind::FileEnd {
            return 0;
        }
        if let Some(&v) = self.state.read().values.get(&kind) {
            return v;
        }
        let mut state = self.state.write();
        // Another writer may have raced us between the read and write locks.
        if let Some(&v) = state.values.get(&kind) {
            return v;
        }
        let v = state.next;
        state.next += 1;
        state.values.insert(kind, v);
        log::trace!("interned new token kind {:?} as {}", kind, v);
        v
    }

    pub fn len(&self) -> usize {
        self.state.read().values.len()
    }
}

impl Default for TokenTypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn file_end_is_reserved_as_zero() {
        let interner = TokenTypeInterner::new();
        assert_eq!(interner.value_of(TokenKind::FileEnd), 0);
        // Even after other types are assigned, FileEnd stays 0.
        interner.value_of(TokenKind::Language(1));
        interner.value_of(TokenKind::Language(2));
        assert_eq!(interner.value_of(TokenKind::FileEnd), 0);
    }

    #[test]
    fn repeated_lookups_are_stable() {
        let interner = TokenTypeInterner::new();
        let a = interner.value_of(TokenKind::Language(5));
        let b = interner.value_of(TokenKind::Language(5));
        assert_eq!(a, b);
        let c = interner.value_of(TokenKind::Language(6));
        assert_ne!(a, c);
    }

    #[test]
    fn concurrent_assignment_is_consistent() {
        let interner = Arc::new(TokenTypeInterner::new());
        let mut handles = Vec::new();
        for t in 0..8u32 {
            let interner = Arc::clone(&interner);
            handles.push(thread::spawn(move || {
                let mut values = Vec::new();
                for _ in 0..200 {
                    values.push(interner.value_of(TokenKind::Language(t % 16)));
                }
                values
            }));
        }
        let mut per_thread = Vec::new();
        for h in handles {
            per_thread.push(h.join().unwrap());
        }
        // Within a thread, the same kind always resolves to the same value.
        for values in &per_thread {
            assert!(values.windows(2).all(|w| w[0] == w[1]));
        }
        // Values assigned for `Language(k)` agree across threads.
        let mut by_kind: AHashMap<u32, TokenValue> = AHashMap::default();
        for (t, values) in per_thread.iter().enumerate() {
            let kind = t as u32 % 16;
            let v = values[0];
            if let Some(&expected) = by_kind.get(&kind) {
                assert_eq!(expected, v);
            } else {
                by_kind.insert(kind, v);
            }
        }
    }
}
