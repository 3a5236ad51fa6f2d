//! Shared lookahead over a [`PullSource`].
//!
//! All cursors forked from one navigator read the same underlying source
//! through one [`TokenBuffer`]. Tokens are addressed by their absolute
//! position in the stream. Each live cursor pins its position, and the
//! buffer drops tokens that are behind every pin.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::error::StreamFault;
use crate::stream::{PullSource, Token};

pub(crate) struct TokenBuffer<S> {
    source: S,
    tokens: VecDeque<Token>,
    // absolute position of tokens[0]
    base: usize,
    pins: Vec<Option<usize>>,
    fault: Option<StreamFault>,
    exhausted: bool,
}

impl<S: PullSource> TokenBuffer<S> {
    pub(crate) fn new(source: S) -> TokenBuffer<S> {
        TokenBuffer {
            source,
            tokens: VecDeque::new(),
            base: 0,
            pins: Vec::new(),
            fault: None,
            exhausted: false,
        }
    }

    /// Token at absolute position `index`, reading ahead as needed.
    ///
    /// Past the end of the document every position reads as `EndDocument`.
    /// A source fault is terminal: it is kept and reported again on every
    /// later read past the buffered tokens.
    pub(crate) fn peek(&mut self, index: usize) -> Result<&Token, StreamFault> {
        debug_assert!(index >= self.base, "position {} was trimmed", index);
        while index >= self.base + self.tokens.len() && !self.exhausted {
            if let Some(fault) = &self.fault {
                return Err(fault.clone());
            }
            match self.source.next_token() {
                Ok(token) => {
                    self.exhausted = token == Token::EndDocument;
                    self.tokens.push_back(token);
                }
                Err(fault) => {
                    self.fault = Some(fault.clone());
                    return Err(fault);
                }
            }
        }

        let offset = (index - self.base).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(offset)
            .ok_or_else(|| StreamFault::new("token buffer is empty"))
    }

    pub(crate) fn pin(&mut self, position: usize) -> usize {
        match self.pins.iter().position(Option::is_none) {
            Some(slot) => {
                self.pins[slot] = Some(position);
                slot
            }
            None => {
                self.pins.push(Some(position));
                self.pins.len() - 1
            }
        }
    }

    pub(crate) fn repin(&mut self, slot: usize, position: usize) {
        self.pins[slot] = Some(position);
        self.trim();
    }

    pub(crate) fn unpin(&mut self, slot: usize) {
        self.pins[slot] = None;
        self.trim();
    }

    fn trim(&mut self) {
        let low = match self.pins.iter().flatten().min() {
            Some(low) => *low,
            None => self.base + self.tokens.len(),
        };
        // the last token stays so an exhausted buffer can keep answering EndDocument
        let keep_last = usize::from(self.exhausted);
        while self.base < low && self.tokens.len() > keep_last {
            self.tokens.pop_front();
            self.base += 1;
        }
    }

    #[cfg(test)]
    pub(crate) fn buffered(&self) -> usize {
        self.tokens.len()
    }
}

/// A position in the shared buffer. Cloning forks an independent cursor.
pub(crate) struct Cursor<S: PullSource> {
    shared: Rc<RefCell<TokenBuffer<S>>>,
    slot: usize,
    position: usize,
}

impl<S: PullSource> Cursor<S> {
    pub(crate) fn new(source: S) -> Cursor<S> {
        let mut buffer = TokenBuffer::new(source);
        let slot = buffer.pin(0);
        Cursor {
            shared: Rc::new(RefCell::new(buffer)),
            slot,
            position: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn advance_to(&mut self, position: usize) {
        self.position = position;
        self.shared.borrow_mut().repin(self.slot, position);
    }

    /// Token at `index`, which must not be behind this cursor's position.
    pub(crate) fn token(&self, index: usize) -> Result<Ref<'_, Token>, StreamFault> {
        debug_assert!(index >= self.position);
        self.shared.borrow_mut().peek(index)?;
        Ok(Ref::map(self.shared.borrow(), |buffer| {
            let offset = (index - buffer.base).min(buffer.tokens.len() - 1);
            &buffer.tokens[offset]
        }))
    }
}

impl<S: PullSource> Clone for Cursor<S> {
    fn clone(&self) -> Cursor<S> {
        let slot = self.shared.borrow_mut().pin(self.position);
        trace!(slot, position = self.position, "forked cursor");
        Cursor {
            shared: Rc::clone(&self.shared),
            slot,
            position: self.position,
        }
    }
}

impl<S: PullSource> Drop for Cursor<S> {
    fn drop(&mut self) {
        if let Ok(mut buffer) = self.shared.try_borrow_mut() {
            buffer.unpin(self.slot);
        }
    }
}
