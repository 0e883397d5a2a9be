//! Cursor-based reader for canonical S-expressions.
//!
//! Canonical form:
//!   atom: ASCII decimal length, ':', then exactly that many payload bytes
//!   list: '(' values ')'
//!
//! No whitespace, binary-clean payloads.  The reader never allocates and
//! never normalizes; all higher layers work on byte offsets into the
//! original buffer so that spliced output stays byte-identical.

use crate::error::Error;

/// Borrowed cursor over a canonical S-expression buffer.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset into the underlying buffer.
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Advance past a single structural byte the caller already peeked.
    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    /// Read an atom's decimal length prefix and consume the colon.
    ///
    /// Rejects an empty length, a zero length, a missing colon, and a
    /// length that does not fit in `usize`.
    pub(crate) fn next_length(&mut self) -> Result<usize, Error> {
        let start = self.pos;
        let mut n: usize = 0;
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            n = n
                .checked_mul(10)
                .and_then(|v| v.checked_add((c - b'0') as usize))
                .ok_or(Error::InvalidSexp)?;
            self.pos += 1;
        }
        if self.pos == start || n == 0 {
            return Err(Error::InvalidSexp);
        }
        if self.peek() != Some(b':') {
            return Err(Error::InvalidSexp);
        }
        self.pos += 1;
        Ok(n)
    }

    /// Consume and return the next `n` payload bytes.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let end = self.pos.checked_add(n).ok_or(Error::InvalidSexp)?;
        let payload = self.buf.get(self.pos..end).ok_or(Error::InvalidSexp)?;
        self.pos = end;
        Ok(payload)
    }

    /// Advance past tokens until the nesting depth drops to zero.
    ///
    /// An open paren increments the depth, a close decrements it, an atom
    /// is skipped by reading its length prefix.
    pub(crate) fn skip(&mut self, mut depth: usize) -> Result<(), Error> {
        while depth > 0 {
            match self.peek() {
                Some(b'(') => {
                    depth += 1;
                    self.bump();
                }
                Some(b')') => {
                    depth -= 1;
                    self.bump();
                }
                Some(_) => {
                    let n = self.next_length()?;
                    self.take(n)?;
                }
                None => return Err(Error::InvalidSexp),
            }
        }
        Ok(())
    }
}

/// Total byte length of the complete well-formed value starting at the
/// beginning of `buf`, which must be an open paren.  Returns zero on any
/// malformation; trailing bytes after the value are ignored.
pub fn canon_len(buf: &[u8]) -> usize {
    if buf.first() != Some(&b'(') {
        return 0;
    }
    let mut r = Reader::new(buf);
    let mut depth = 0usize;
    loop {
        match r.peek() {
            Some(b'(') => {
                depth += 1;
                r.bump();
            }
            Some(b')') => {
                if depth == 0 {
                    return 0;
                }
                depth -= 1;
                r.bump();
                if depth == 0 {
                    return r.pos();
                }
            }
            Some(_) => {
                let Ok(n) = r.next_length() else {
                    return 0;
                };
                if r.take(n).is_err() {
                    return 0;
                }
            }
            None => return 0,
        }
    }
}
