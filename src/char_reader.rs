// Copyright (c) 2025 Redglyph (@gmail.com). All Rights Reserved.

//! Character source of the driving parser: decodes a UTF-8 byte stream one character at a
//! time, keeping track of the byte offset and of the character index.

use std::io::{BufReader, Read};

// Valid codepoint values:
//
// 000000 - 00007f: 1 byte
// 000080 - 0007ff: 2 bytes
// 000800 - 00d7ff: 3 bytes
// --------------------------
// 00d800 - 00dfff: forbidden
// --------------------------
// 00e000 - 00ffff: 3 bytes
// 010000 - 10ffff: 4 bytes

pub const UTF8_MIN: u32      =        0;
pub const UTF8_LOW_MAX: u32  =   0xd7ff;
pub const UTF8_GAP_MIN: u32  =   0xd800;
pub const UTF8_GAP_MAX: u32  =   0xdfff;
pub const UTF8_HIGH_MIN: u32 =   0xe000;
pub const UTF8_MAX: u32      = 0x10ffff;

/// Determines the number of bytes required to encode a UTF-8 character from its first byte,
/// or 0 if the byte can't start a character.
#[inline]
pub fn utf8_len(byte: u8) -> usize {
    match byte {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub enum CharReaderStatus {
    #[default]
    Reading,
    Error(String),
    Closed
}

pub struct CharReader<R> {
    reader: BufReader<R>,
    /// offset of next character, in bytes
    offset: u64,
    /// index of next character
    index: usize,
    status: CharReaderStatus,
    peek: Option<(Option<char>, usize, CharReaderStatus)>,
}

impl<R: Read> CharReader<R> {
    pub fn new(source: R) -> Self {
        CharReader {
            reader: BufReader::new(source),
            offset: 0,
            index: 0,
            status: CharReaderStatus::Reading,
            peek: None,
        }
    }

    pub fn is_reading(&self) -> bool {
        matches!(self.status, CharReaderStatus::Reading)
    }

    /// Offset of the next character, in bytes.
    pub fn get_offset(&self) -> u64 {
        self.offset
    }

    /// Index of the next character.
    pub fn get_index(&self) -> usize {
        self.index
    }

    pub fn get_status(&self) -> &CharReaderStatus {
        &self.status
    }

    pub fn chars(&mut self) -> CharReaderIter<'_, R> {
        CharReaderIter { creader: self }
    }

    /// Reads the next character. `None` marks the end of the input, or an error if the
    /// status is [CharReaderStatus::Error].
    pub fn get_char(&mut self) -> Option<char> {
        let (c, len, status) = match self.peek.take() {
            Some(peek) => peek,
            None => self.read_char(),
        };
        self.offset += len as u64;
        if c.is_some() {
            self.index += 1;
        }
        self.status = status;
        c
    }

    /// Returns the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        if self.peek.is_none() {
            self.peek = Some(self.read_char());
        }
        self.peek.as_ref().and_then(|p| p.0)
    }

    fn read_char(&mut self) -> (Option<char>, usize, CharReaderStatus) {
        if !self.is_reading() {
            return (None, 0, self.status.clone());
        }
        let mut buffer = [0; 4];
        match self.reader.read(&mut buffer[0..=0]) {
            Ok(0) => (None, 0, CharReaderStatus::Closed),
            Ok(_) => {
                let len = utf8_len(buffer[0]);
                if len == 0 {
                    return (None, 0, self.encoding_error());
                }
                if len > 1 {
                    if let Err(e) = self.reader.read_exact(&mut buffer[1..len]) {
                        return (None, 0, CharReaderStatus::Error(e.to_string()));
                    }
                }
                match std::str::from_utf8(&buffer[..len]).ok().and_then(|s| s.chars().next()) {
                    Some(c) => (Some(c), len, CharReaderStatus::Reading),
                    None => (None, 0, self.encoding_error()),
                }
            }
            Err(e) => (None, 0, CharReaderStatus::Error(e.to_string())),
        }
    }

    fn encoding_error(&self) -> CharReaderStatus {
        CharReaderStatus::Error(format!("UTF-8 encoding error at offset {}", self.offset))
    }
}

pub struct CharReaderIter<'a, R> {
    creader: &'a mut CharReader<R>
}

pub struct IterChar {
    /// next character from the stream
    pub char: char,
    /// index of `char` in the stream
    pub index: usize,
    /// offset of `char` in the stream, in bytes
    pub offset: u64
}

impl<'a, R: Read> Iterator for CharReaderIter<'a, R> {
    type Item = IterChar;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.creader.offset;
        let index = self.creader.index;
        let c = self.creader.get_char();
        c.map(|c| IterChar { char: c, index, offset })
    }
}

// ---------------------------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------------------------
