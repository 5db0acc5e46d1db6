// Copyright 2023-2026 The canopy Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The input cursor.
//!
//! A [`Cursor`] owns the decoded input as a queue of tendrils and supports
//! incremental consumption: single-character peek/next, bulk scans over
//! characters outside a [`SmallCharSet`], multi-character literal lookahead,
//! and pushing consumed characters back for backtracking. It tracks the
//! absolute source position of the next unread character.
//!
//! Newline bookkeeping: the cursor counts a bare CR and a CRLF pair as a
//! single line break for position purposes. Collapsing the *character
//! stream* (surfacing both as one `\n`) is the tokenizer's job, since a
//! peeked `\r` must still be observable raw.

use std::collections::VecDeque;

use crate::errors::Position;
use crate::tendril::StrTendril;
use crate::util::smallcharset::SmallCharSet;

pub use self::SetResult::{FromSet, NotFromSet};

/// Result from [`Cursor::pop_except_from`] containing either a character
/// from the set, or a buffer of characters none of which are in the set.
#[derive(PartialEq, Eq, Debug)]
pub enum SetResult {
    /// A character from the `SmallCharSet`.
    FromSet(char),
    /// A block of text containing no characters from the `SmallCharSet`.
    NotFromSet(StrTendril),
}

/// A queue of owned string buffers with position tracking.
pub struct Cursor {
    /// Buffers to process.
    buffers: VecDeque<StrTendril>,

    /// Position of the next unread character.
    pos: Position,

    /// Column width of a tab stop.
    tab_stop: u32,

    /// Was the last consumed character a CR? A directly following LF then
    /// belongs to the same line break.
    last_was_cr: bool,
}

impl Cursor {
    pub fn new(tab_stop: u32) -> Cursor {
        Cursor {
            buffers: VecDeque::with_capacity(16),
            pos: Position::start(),
            tab_stop: tab_stop.max(1),
            last_was_cr: false,
        }
    }

    /// Returns whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// The position of the next unread character.
    pub fn position(&self) -> Position {
        self.pos
    }

    /// Add a buffer to the end of the queue.
    pub fn push_back(&mut self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.buffers.push_back(buf);
    }

    /// Add a buffer at the front of the queue, without touching the
    /// position. This is the insertion point: text supplied while the
    /// parser is suspended (document.write-style) lands here.
    pub fn push_front(&mut self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        self.buffers.push_front(buf);
    }

    /// Push previously consumed characters back at the front of the queue,
    /// rewinding the position to what it was before they were consumed.
    ///
    /// Only the backtracking paths use this, and none of them ever rewinds
    /// over a line break or a tab.
    pub fn unconsume(&mut self, buf: StrTendril) {
        if buf.len32() == 0 {
            return;
        }
        debug_assert!(
            !buf.contains('\n') && !buf.contains('\r') && !buf.contains('\t'),
            "cannot rewind over line breaks"
        );
        self.pos.offset -= buf.len() as u64;
        self.pos.col -= buf.chars().count() as u64;
        self.buffers.push_front(buf);
    }

    /// Look at the next available character, if any.
    pub fn peek(&self) -> Option<char> {
        // Invariant: all buffers in the queue are non-empty.
        self.buffers.front().map(|b| b.chars().next().unwrap())
    }

    /// Get the next character, if one is available.
    pub fn next(&mut self) -> Option<char> {
        let (result, now_empty) = match self.buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let c = buf.pop_front_char().expect("empty buffer in queue");
                (Some(c), buf.is_empty())
            },
        };

        if now_empty {
            self.buffers.pop_front();
        }

        if let Some(c) = result {
            self.note(c);
        }
        result
    }

    /// Pops and returns either a single character from the given set, or a
    /// buffer of characters none of which are in the set.
    ///
    /// The tokenizer always includes `\r`, `\n`, and `\0` in the set, so a
    /// returned run never spans a line break.
    pub fn pop_except_from(&mut self, set: SmallCharSet) -> Option<SetResult> {
        let (result, now_empty) = match self.buffers.front_mut() {
            None => (None, false),
            Some(buf) => {
                let n = set.nonmember_prefix_len(buf);
                if n > 0 {
                    let out = buf.subtendril(0, n);
                    buf.pop_front(n);
                    (Some(NotFromSet(out)), buf.is_empty())
                } else {
                    let c = buf.pop_front_char().expect("empty buffer in queue");
                    (Some(FromSet(c)), buf.is_empty())
                }
            },
        };

        if now_empty {
            self.buffers.pop_front();
        }

        match result {
            Some(NotFromSet(ref out)) => {
                debug_assert!(!out.contains('\n') && !out.contains('\r'));
                for c in out.chars() {
                    self.note(c);
                }
            },
            Some(FromSet(c)) => self.note(c),
            None => (),
        }
        result
    }

    /// Check if the next characters match `pat`, under the byte equivalence
    /// `eq` (`u8::eq` for exact, `u8::eq_ignore_ascii_case` for keywords).
    ///
    /// If so, consume them and return `Some(true)`.
    /// If they do not match, return `Some(false)` and consume nothing.
    /// If not enough characters are available to know, return `None`.
    pub fn eat(&mut self, pat: &str, eq: fn(&u8, &u8) -> bool) -> Option<bool> {
        let mut buffers_exhausted = 0;
        let mut consumed_from_last = 0;
        self.buffers.front()?;

        for pattern_byte in pat.bytes() {
            if buffers_exhausted >= self.buffers.len() {
                return None;
            }
            let buf = &self.buffers[buffers_exhausted];

            if !eq(&buf.as_bytes()[consumed_from_last], &pattern_byte) {
                return Some(false);
            }

            consumed_from_last += 1;
            if consumed_from_last >= buf.len() {
                buffers_exhausted += 1;
                consumed_from_last = 0;
            }
        }

        // We have a match. Commit changes to the queue.
        for _ in 0..buffers_exhausted {
            self.buffers.pop_front();
        }

        match self.buffers.front_mut() {
            None => assert_eq!(consumed_from_last, 0),
            Some(buf) => buf.pop_front(consumed_from_last as u32),
        }

        // Patterns are ASCII keywords; no line breaks or tabs to account for.
        self.pos.offset += pat.len() as u64;
        self.pos.col += pat.len() as u64;
        self.last_was_cr = false;

        Some(true)
    }

    /// Account for one consumed character.
    fn note(&mut self, c: char) {
        self.pos.offset += c.len_utf8() as u64;
        match c {
            '\r' => {
                self.pos.line += 1;
                self.pos.col = 1;
                self.last_was_cr = true;
                return;
            },
            '\n' => {
                if !self.last_was_cr {
                    self.pos.line += 1;
                    self.pos.col = 1;
                }
            },
            '\t' => {
                let tab = self.tab_stop as u64;
                self.pos.col = ((self.pos.col - 1) / tab) * tab + tab + 1;
            },
            _ => self.pos.col += 1,
        }
        self.last_was_cr = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tendril::SliceExt;

    #[test]
    fn smoke_test() {
        let mut cur = Cursor::new(8);
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.next(), None);

        cur.push_back("abc".to_tendril());
        assert_eq!(cur.peek(), Some('a'));
        assert_eq!(cur.next(), Some('a'));
        assert_eq!(cur.peek(), Some('b'));
        assert_eq!(cur.next(), Some('b'));
        assert_eq!(cur.next(), Some('c'));
        assert_eq!(cur.next(), None);
    }

    #[test]
    fn can_unconsume() {
        let mut cur = Cursor::new(8);
        cur.push_back("abc".to_tendril());
        assert_eq!(cur.next(), Some('a'));
        let pos = cur.position();

        cur.unconsume("a".to_tendril());
        assert_eq!(cur.position().offset, 0);
        assert_eq!(cur.next(), Some('a'));
        assert_eq!(cur.position(), pos);
        assert_eq!(cur.next(), Some('b'));
        assert_eq!(cur.next(), Some('c'));
        assert_eq!(cur.next(), None);
    }

    #[test]
    fn can_pop_except_set() {
        let mut cur = Cursor::new(8);
        cur.push_back("abc&def".to_tendril());
        let mut pop = || cur.pop_except_from(small_char_set!('&' '\0' '\r' '\n'));
        assert_eq!(pop(), Some(NotFromSet("abc".to_tendril())));
        assert_eq!(pop(), Some(FromSet('&')));
        assert_eq!(pop(), Some(NotFromSet("def".to_tendril())));
        assert_eq!(pop(), None);
    }

    #[test]
    fn can_eat() {
        let mut cur = Cursor::new(8);
        cur.push_back("a".to_tendril());
        cur.push_back("bc".to_tendril());
        assert_eq!(cur.eat("abcd", u8::eq_ignore_ascii_case), None);
        assert_eq!(cur.eat("ax", u8::eq_ignore_ascii_case), Some(false));
        assert_eq!(cur.eat("AB", u8::eq_ignore_ascii_case), Some(true));
        assert_eq!(cur.next(), Some('c'));
        assert_eq!(cur.next(), None);
    }

    #[test]
    fn tracks_lines_and_columns() {
        let mut cur = Cursor::new(4);
        cur.push_back("a\tb\r\nc\rd\ne".to_tendril());
        while cur.next().is_some() {}
        let pos = cur.position();
        assert_eq!(pos.line, 4);
        assert_eq!(pos.col, 2);
        assert_eq!(pos.offset, 10);
    }

    #[test]
    fn tab_stops() {
        let mut cur = Cursor::new(8);
        cur.push_back("\ta".to_tendril());
        cur.next();
        assert_eq!(cur.position().col, 9);
        cur.next();
        assert_eq!(cur.position().col, 10);
    }
}
