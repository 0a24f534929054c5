//! A single parsed magic rule and its evaluation against a byte source.

use byteorder::{BigEndian, LittleEndian, NativeEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

use crate::escape;

/// One parsed line of the rule grammar. The match data stays in its raw,
/// escaped form until evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub dependent: bool,
    pub offset: u64,
    pub match_type: MatchType,
    pub match_data: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

/// The fixed set of directive types the grammar knows. Unrecognized
/// tokens are retained but read nothing, so they can never match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchType {
    Byte,
    Short,
    Long,
    String,
    Date,
    BeShort,
    BeLong,
    BeDate,
    LeShort,
    LeLong,
    LeDate,
    Unknown(std::string::String),
}

impl MatchType {
    /// Classifies a match-type token, lower-casing it first.
    pub fn from_token(token: &str) -> MatchType {
        use self::MatchType::*;

        match token.to_ascii_lowercase().as_str() {
            "byte" => Byte,
            "short" => Short,
            "long" => Long,
            "string" => String,
            "date" => Date,
            "beshort" => BeShort,
            "belong" => BeLong,
            "bedate" => BeDate,
            "leshort" => LeShort,
            "lelong" => LeLong,
            "ledate" => LeDate,
            other => Unknown(other.to_owned()),
        }
    }
}

impl Rule {
    /// Resolves this rule's offset against `source` and tests it.
    ///
    /// Independent rules seek to their absolute offset and overwrite the
    /// parent anchor whether or not they go on to match. Dependent rules
    /// seek to the anchor and then skip `offset` additional bytes.
    pub fn matches<F: Read + Seek>(&self, source: &mut F, parent_offset: &mut u64) -> bool {
        if self.dependent {
            if source.seek(SeekFrom::Start(*parent_offset)).is_err() {
                return false;
            }
            if source.seek(SeekFrom::Current(self.offset as i64)).is_err() {
                return false;
            }
        } else {
            *parent_offset = self.offset;
            if source.seek(SeekFrom::Start(self.offset)).is_err() {
                return false;
            }
        }

        let wanted = escape::decode(&self.match_data);
        match self.read_value(source, wanted.len()) {
            Some(found) => found == wanted,
            None => false,
        }
    }

    /// Reads the value this rule's directive calls for, canonicalized to
    /// the byte string it is compared as. Numeric reads render as decimal;
    /// string reads are the raw bytes. A short read or an unknown
    /// directive yields `None`, which matches nothing.
    fn read_value<F: Read>(&self, source: &mut F, wanted_len: usize) -> Option<Vec<u8>> {
        use self::MatchType::*;

        match &self.match_type {
            Byte => source.read_i8().ok().map(decimal),
            Short => source.read_i16::<NativeEndian>().ok().map(decimal),
            Long => source.read_i32::<NativeEndian>().ok().map(decimal),
            String => {
                let mut buf = vec![0u8; wanted_len];
                source.read_exact(&mut buf).ok()?;
                Some(buf)
            }
            // An 8-byte read, even though the grammar calls this a 32-bit
            // Unix date. Kept for compatibility with existing rule files.
            Date => source.read_i64::<BigEndian>().ok().map(decimal),
            BeShort => source.read_u16::<BigEndian>().ok().map(decimal),
            BeLong => source.read_u32::<BigEndian>().ok().map(decimal),
            BeDate => source.read_u32::<BigEndian>().ok().map(decimal),
            LeShort => source.read_u16::<LittleEndian>().ok().map(decimal),
            LeLong => source.read_u32::<LittleEndian>().ok().map(decimal),
            LeDate => source.read_u32::<LittleEndian>().ok().map(decimal),
            Unknown(_) => None,
        }
    }
}

fn decimal<N: ToString>(value: N) -> Vec<u8> {
    value.to_string().into_bytes()
}
