//! A single scheduling decision and its on-disk text form.
//!
//! Every time the governor hands control to a thread it produces one
//! [`Decision`]. Decisions are persisted as one ASCII line each,
//! `"{thread_id} {available} {higher}\n"`, and the strictness of that
//! grammar is part of the contract: the reader stops at the first byte that
//! does not conform, which is how an interrupted run is told apart from a
//! completed one.

use std::fmt;

/// One scheduling decision.
///
/// `higher` counts the subscribed thread ids strictly greater than
/// `thread_id` at the moment of the decision. Under the canonical ascending
/// ordering of ids this is exactly the number of alternatives that remain
/// untried at this point, which is the only state the depth-first advance
/// between runs needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// User-assigned id of the chosen thread.
    pub thread_id: usize,
    /// Number of subscribed threads at the moment of choice.
    pub available: usize,
    /// Number of subscribed ids strictly greater than `thread_id`.
    pub higher: usize,
}

impl Decision {
    /// Parses one decision record from the front of `input`.
    ///
    /// Returns the decision and the number of bytes consumed, or `None` if
    /// the front of `input` is not exactly `uint SP uint SP uint NL`.
    /// Trailing whitespace inside a record is a parse failure.
    #[must_use]
    pub fn parse(input: &[u8]) -> Option<(Self, usize)> {
        let (thread_id, mut pos) = parse_uint(input)?;
        pos = expect_byte(input, pos, b' ')?;
        let (available, used) = parse_uint(&input[pos..])?;
        pos += used;
        pos = expect_byte(input, pos, b' ')?;
        let (higher, used) = parse_uint(&input[pos..])?;
        pos += used;
        pos = expect_byte(input, pos, b'\n')?;

        Some((
            Self {
                thread_id,
                available,
                higher,
            },
            pos,
        ))
    }

    /// True when the alternative count is consistent with the choice width.
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.higher < self.available
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.thread_id, self.available, self.higher)
    }
}

fn parse_uint(input: &[u8]) -> Option<(usize, usize)> {
    let mut value: usize = 0;
    let mut len = 0;
    while let Some(digit) = input.get(len).filter(|b| b.is_ascii_digit()) {
        value = value
            .checked_mul(10)?
            .checked_add(usize::from(digit - b'0'))?;
        len += 1;
    }
    if len == 0 {
        return None;
    }
    Some((value, len))
}

fn expect_byte(input: &[u8], pos: usize, byte: u8) -> Option<usize> {
    (input.get(pos) == Some(&byte)).then_some(pos + 1)
}
