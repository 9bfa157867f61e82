//! Publish handle for the most recent rate tables.
//!
//! The sampling loop is the only writer. Readers (console, HTTP handlers,
//! exporters) take an `Arc` to the whole table set, so they observe either the
//! previous cycle or the new one, never a mix.

use std::sync::{Arc, PoisonError, RwLock};

use crate::tables::RateTables;

/// Cloneable handle to the latest published [`RateTables`].
#[derive(Debug, Clone, Default)]
pub struct RateBoard {
    latest: Arc<RwLock<Arc<RateTables>>>,
}

impl RateBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the published tables as a whole.
    pub fn publish(&self, tables: RateTables) {
        let tables = Arc::new(tables);
        let mut slot = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *slot = tables;
    }

    /// The most recently published tables (empty before the first cycle).
    pub fn latest(&self) -> Arc<RateTables> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tables(open: u64) -> RateTables {
        let mut t = RateTables {
            interval_secs: 1,
            ..Default::default()
        };
        t.mdt
            .entry("mdt0".into())
            .or_default()
            .insert("open".into(), open);
        t.mdt
            .entry("mdt1".into())
            .or_default()
            .insert("open".into(), open);
        t
    }

    #[test]
    fn test_empty_before_first_publish() {
        let board = RateBoard::new();
        assert!(board.latest().is_empty());
    }

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let board = RateBoard::new();
        board.publish(tables(1));
        let held = board.latest();
        board.publish(tables(2));

        assert_eq!(held.mdt["mdt0"]["open"], 1);
        assert_eq!(board.latest().mdt["mdt0"]["open"], 2);
    }

    #[test]
    fn test_readers_never_see_mixed_cycles() {
        let board = RateBoard::new();
        board.publish(tables(0));

        let writer = {
            let board = board.clone();
            thread::spawn(move || {
                for n in 1..=500 {
                    board.publish(tables(n));
                }
            })
        };
        let reader = {
            let board = board.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    let t = board.latest();
                    assert_eq!(t.mdt["mdt0"]["open"], t.mdt["mdt1"]["open"]);
                }
            })
        };

        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(board.latest().mdt["mdt0"]["open"], 500);
    }
}
