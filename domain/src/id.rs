//! Link id generation: base62-encoded sequence numbers plus an allocator that
//! skips ids already present in a list.

use crate::{CoreError, IdGenerator, LinkId};

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode `n` in base62 over 0-9, A-Z, a-z. Zero encodes to "0".
pub fn encode_base62(mut n: u64) -> String {
    let mut digits = Vec::with_capacity(11);
    loop {
        digits.push(ALPHABET[(n % 62) as usize] as char);
        n /= 62;
        if n == 0 {
            break;
        }
    }
    digits.iter().rev().collect()
}

/// Base62 id generator. Deterministic w.r.t. `seq`; left-pads with '0' up to
/// `min_width`.
#[derive(Clone, Copy, Debug)]
pub struct Base62IdGenerator {
    min_width: usize,
}

impl Base62IdGenerator {
    pub fn new(min_width: usize) -> Self {
        Self { min_width }
    }
}

impl IdGenerator for Base62IdGenerator {
    fn id_for(&self, seq: u64) -> LinkId {
        let encoded = encode_base62(seq);
        let padded = format!("{:0>width$}", encoded, width = self.min_width);
        // Alphanumeric by construction, so skip `LinkId::new` validation.
        LinkId(padded)
    }
}

/// Hands out ids from a generator, skipping any already in use.
pub struct IdAllocator<G: IdGenerator> {
    generator: G,
    next_seq: u64,
}

impl<G: IdGenerator> IdAllocator<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            next_seq: 0,
        }
    }

    /// Allocate an id for which `is_taken` is false. `existing` is the number
    /// of ids currently taken; an injective generator needs at most
    /// `existing + 1` draws.
    pub fn allocate<F>(&mut self, existing: usize, is_taken: F) -> Result<LinkId, CoreError>
    where
        F: Fn(&LinkId) -> bool,
    {
        for _ in 0..=existing {
            let seq = self.next_seq;
            self.next_seq = self.next_seq.wrapping_add(1);
            let id = self.generator.id_for(seq);
            if !is_taken(&id) {
                return Ok(id);
            }
        }
        Err(CoreError::Repository(
            "failed to generate unique link id".into(),
        ))
    }
}
