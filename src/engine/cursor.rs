//! Forward cursors over a bucket

use std::ops::Bound;

use crate::error::Result;

use super::Engine;

/// Where a cursor currently stands
enum Position {
    Unpositioned,
    At(Vec<u8>),
    End,
}

/// Forward cursor over one bucket's entries
///
/// Every step merges the MemTable and all SSTables; returned keys are the
/// bucket-relative user keys.
pub struct Cursor<'t> {
    engine: &'t Engine,
    prefix: Vec<u8>,
    position: Position,
}

impl<'t> Cursor<'t> {
    pub(super) fn new(engine: &'t Engine, prefix: Vec<u8>) -> Self {
        Self {
            engine,
            prefix,
            position: Position::Unpositioned,
        }
    }

    /// Move to the first entry of the bucket
    pub fn first(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.seek(b"")
    }

    /// Move to the first entry whose key is ≥ `key`
    pub fn seek(&mut self, key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut target = self.prefix.clone();
        target.extend_from_slice(key);
        self.step(Bound::Included(target.as_slice()))
    }

    /// Move to the entry after the current one
    ///
    /// An unpositioned cursor starts at the first entry; a cursor past the
    /// end stays there.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        match std::mem::replace(&mut self.position, Position::End) {
            Position::Unpositioned => self.first(),
            Position::At(current) => self.step(Bound::Excluded(current.as_slice())),
            Position::End => Ok(None),
        }
    }

    fn step(&mut self, lower: Bound<&[u8]>) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        match self.engine.first_internal(lower)? {
            Some((internal, value)) if internal.starts_with(&self.prefix) => {
                let user_key = internal[self.prefix.len()..].to_vec();
                self.position = Position::At(internal);
                Ok(Some((user_key, value)))
            }
            _ => {
                self.position = Position::End;
                Ok(None)
            }
        }
    }
}

/// Iterator adapter over a cursor, starting from a seek key
pub struct BucketIter<'t> {
    cursor: Cursor<'t>,
    start: Option<Vec<u8>>,
}

impl<'t> BucketIter<'t> {
    pub(super) fn new(cursor: Cursor<'t>, start: Vec<u8>) -> Self {
        Self {
            cursor,
            start: Some(start),
        }
    }
}

impl<'t> Iterator for BucketIter<'t> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match self.start.take() {
            Some(start) => self.cursor.seek(&start),
            None => self.cursor.next(),
        };
        step.transpose()
    }
}
