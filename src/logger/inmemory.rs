// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

//! A trace buffer in coprocessor RAM which the host can read out over the debug interface.

use core::{
    cmp::min,
    fmt::{self, Write},
};
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// An in-memory log with a circular buffer.
///
/// The layout is fixed so that a debugger, or the host through the shared RAM window, can find the
/// write position and the byte count at the start of the buffer.
#[derive(FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct MemoryLogger<const BUFFER_SIZE: usize> {
    /// The position in `buffer` at which to write the next byte.
    next_offset: usize,
    /// The total number of bytes logged since the logger was created or reset. This may be
    /// greater than `BUFFER_SIZE`, in which case the oldest bytes have been overwritten.
    logged_bytes_count: usize,
    buffer: [u8; BUFFER_SIZE],
}

impl<const BUFFER_SIZE: usize> MemoryLogger<BUFFER_SIZE> {
    /// Creates an empty log.
    pub const fn new() -> Self {
        Self {
            next_offset: 0,
            logged_bytes_count: 0,
            buffer: [0; BUFFER_SIZE],
        }
    }

    /// Discards everything logged so far.
    pub fn reset(&mut self) {
        self.next_offset = 0;
        self.logged_bytes_count = 0;
    }

    /// Returns the number of bytes logged since the logger was created or reset.
    pub fn logged_bytes_count(&self) -> usize {
        self.logged_bytes_count
    }

    fn add_bytes(&mut self, bytes: &[u8]) {
        self.logged_bytes_count += bytes.len();
        // Only the last `BUFFER_SIZE` bytes can survive.
        let bytes = &bytes[bytes.len().saturating_sub(BUFFER_SIZE)..];

        let (head, tail) = bytes.split_at(min(bytes.len(), BUFFER_SIZE - self.next_offset));
        self.buffer[self.next_offset..][..head.len()].copy_from_slice(head);
        self.buffer[..tail.len()].copy_from_slice(tail);
        self.next_offset = (self.next_offset + bytes.len()) % BUFFER_SIZE;
    }

    /// Returns the longest valid UTF-8 suffix of what is still in the buffer, oldest byte first.
    ///
    /// Once the buffer has wrapped, its oldest character may have been partly overwritten; those
    /// bytes are skipped.
    pub fn as_str(&mut self) -> &str {
        if self.logged_bytes_count >= BUFFER_SIZE {
            self.buffer.rotate_left(self.next_offset);
            self.next_offset = 0;
        }

        let mut contents = &self.buffer[..min(BUFFER_SIZE, self.logged_bytes_count)];
        loop {
            match core::str::from_utf8(contents) {
                Ok(text) => return text,
                // A broken sequence at the start is at most 3 bytes, possibly reported in pieces.
                Err(e) if e.valid_up_to() == 0 => match e.error_len() {
                    Some(len) => contents = &contents[len..],
                    None => return "",
                },
                // Everything written through `Write` is valid, so only the start can be broken.
                Err(e) => contents = &contents[..e.valid_up_to()],
            }
        }
    }
}

impl<const BUFFER_SIZE: usize> Default for MemoryLogger<BUFFER_SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BUFFER_SIZE: usize> Write for MemoryLogger<BUFFER_SIZE> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if BUFFER_SIZE > 0 {
            self.add_bytes(s.as_bytes());
        }
        Ok(())
    }
}
