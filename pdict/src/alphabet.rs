// Copyright (c) 2021 10X Genomics, Inc. All rights reserved.

//! Symbol classification for the trusted band and its flanks.
//!
//! `TwobitCodec` maps the four declared base bytes onto 2-bit codes and every
//! other byte onto `None`. `iupac_mask` maps IUPAC letters onto the set of
//! bases they stand for, which the ambiguity-aware mismatch comparators use.
use crate::errors::{PDictError, Result};
use serde::{Deserialize, Serialize};

const INVALID: u8 = u8::MAX;

/// The four byte values that are packed into 2-bit codes 0, 1, 2 and 3.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseCodes([u8; 4]);

impl BaseCodes {
    /// A, C, G and T.
    pub const DNA: BaseCodes = BaseCodes(*b"ACGT");
    /// A, C, G and U.
    pub const RNA: BaseCodes = BaseCodes(*b"ACGU");

    /// Fails unless the four bytes are distinct.
    pub fn new(codes: [u8; 4]) -> Result<Self> {
        for i in 0..4 {
            if codes[i + 1..].contains(&codes[i]) {
                return Err(PDictError::InvalidBaseCodes { codes });
            }
        }
        Ok(BaseCodes(codes))
    }

    /// Same as `BaseCodes::DNA`.
    pub fn dna() -> Self {
        Self::DNA
    }

    /// Same as `BaseCodes::RNA`.
    pub fn rna() -> Self {
        Self::RNA
    }

    /// The bytes for codes 0, 1, 2 and 3.
    pub fn codes(&self) -> [u8; 4] {
        self.0
    }
}

impl Default for BaseCodes {
    fn default() -> Self {
        Self::DNA
    }
}

impl TryFrom<&[u8]> for BaseCodes {
    type Error = PDictError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let mut codes = [0u8; 4];
        if bytes.len() != 4 {
            // Report what we got, padded, so the message is still meaningful.
            for (c, b) in codes.iter_mut().zip(bytes) {
                *c = *b;
            }
            return Err(PDictError::InvalidBaseCodes { codes });
        }
        codes.copy_from_slice(bytes);
        BaseCodes::new(codes)
    }
}

impl TryFrom<String> for BaseCodes {
    type Error = PDictError;

    fn try_from(s: String) -> Result<Self> {
        BaseCodes::try_from(s.as_bytes())
    }
}

impl From<BaseCodes> for String {
    fn from(codes: BaseCodes) -> String {
        String::from_utf8_lossy(&codes.0).into_owned()
    }
}

/// Byte to 2-bit code lookup, built once per `BaseCodes`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwobitCodec {
    base_codes: BaseCodes,
    lkup: [u8; 256],
}

impl TwobitCodec {
    /// Build the 256-entry lookup of `base_codes`.
    pub const fn new(base_codes: BaseCodes) -> Self {
        let mut lkup = [INVALID; 256];
        // `for` isn't allowed in const contexts.
        let mut i = 0;
        while i < 4 {
            lkup[base_codes.0[i] as usize] = i as u8;
            i += 1;
        }
        TwobitCodec { base_codes, lkup }
    }

    /// The base codes this codec was built from.
    pub fn base_codes(&self) -> BaseCodes {
        self.base_codes
    }

    /// The 2-bit code of `c`, or `None` if `c` is not one of the base codes.
    #[inline]
    pub fn encode(&self, c: u8) -> Option<u8> {
        match self.lkup[c as usize] {
            INVALID => None,
            code => Some(code),
        }
    }

    /// The base byte for a 2-bit code.
    #[inline]
    pub fn decode(&self, code: u8) -> u8 {
        self.base_codes.0[(code & 3) as usize]
    }

    /// Pack `seq` two bits per symbol, first symbol most significant.
    /// Returns `None` if `seq` holds a non-base symbol or is too long for a u32.
    pub fn signature(&self, seq: &[u8]) -> Option<u32> {
        if seq.len() > 16 {
            return None;
        }
        seq.iter()
            .try_fold(0u32, |sign, &c| Some((sign << 2) | u32::from(self.encode(c)?)))
    }

    /// Inverse of `signature` for a window of `width` symbols.
    pub fn unsignature(&self, mut sign: u32, width: usize) -> Vec<u8> {
        let mut seq = vec![0u8; width];
        for c in seq.iter_mut().rev() {
            *c = self.decode((sign & 3) as u8);
            sign >>= 2;
        }
        seq
    }
}

impl Default for TwobitCodec {
    fn default() -> Self {
        TwobitCodec::new(BaseCodes::DNA)
    }
}

impl From<BaseCodes> for TwobitCodec {
    fn from(base_codes: BaseCodes) -> Self {
        TwobitCodec::new(base_codes)
    }
}

const A: u8 = 0b0001;
const C: u8 = 0b0010;
const G: u8 = 0b0100;
const T: u8 = 0b1000;

const IUPAC_MASKS: [u8; 256] = make_iupac_masks();

const fn make_iupac_masks() -> [u8; 256] {
    let mut masks = [0u8; 256];
    const LETTERS: &[u8; 16] = b"ACGTURYSWKMBDHVN";
    const SETS: [u8; 16] = [
        A,
        C,
        G,
        T,
        T,
        A | G,
        C | T,
        C | G,
        A | T,
        G | T,
        A | C,
        C | G | T,
        A | G | T,
        A | C | T,
        A | C | G,
        A | C | G | T,
    ];
    let mut i = 0;
    while i < LETTERS.len() {
        masks[LETTERS[i] as usize] = SETS[i];
        masks[LETTERS[i] as usize + 32] = SETS[i]; // lowercase variants
        i += 1;
    }
    masks
}

/// Set of bases an IUPAC letter stands for, one bit per base.
/// Zero for bytes outside the IUPAC alphabet.
#[inline]
pub const fn iupac_mask(c: u8) -> u8 {
    IUPAC_MASKS[c as usize]
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::proptest;

    #[test]
    fn test_encode() {
        let codec = TwobitCodec::default();
        assert_eq!(codec.encode(b'A'), Some(0));
        assert_eq!(codec.encode(b'C'), Some(1));
        assert_eq!(codec.encode(b'G'), Some(2));
        assert_eq!(codec.encode(b'T'), Some(3));
        assert_eq!(codec.encode(b'N'), None);
        assert_eq!(codec.encode(b'a'), None);

        let rna = TwobitCodec::new(BaseCodes::rna());
        assert_eq!(rna.encode(b'U'), Some(3));
        assert_eq!(rna.encode(b'T'), None);
    }

    #[test]
    fn test_custom_base_codes() {
        let codes = BaseCodes::new(*b"TGCA").unwrap();
        let codec = TwobitCodec::from(codes);
        assert_eq!(codec.signature(b"TT"), Some(0));
        assert_eq!(codec.signature(b"AA"), Some(15));

        assert_eq!(
            BaseCodes::new(*b"ACGA"),
            Err(PDictError::InvalidBaseCodes { codes: *b"ACGA" })
        );
        assert!(BaseCodes::try_from(&b"ACG"[..]).is_err());
        assert_eq!(BaseCodes::try_from("ACGU".to_string()), Ok(BaseCodes::RNA));
    }

    #[test]
    fn test_signature() {
        let codec = TwobitCodec::default();
        assert_eq!(codec.signature(b"ACGT"), Some(0b00_01_10_11));
        assert_eq!(codec.signature(b"T"), Some(3));
        assert_eq!(codec.signature(b""), Some(0));
        assert_eq!(codec.signature(b"ACNT"), None);
    }

    #[test]
    fn test_iupac() {
        assert_eq!(iupac_mask(b'N'), 0b1111);
        assert_eq!(iupac_mask(b'r'), iupac_mask(b'R'));
        assert_eq!(iupac_mask(b'U'), iupac_mask(b'T'));
        assert_eq!(iupac_mask(b'-'), 0);
        for c in *b"BDHV" {
            assert_eq!(iupac_mask(c).count_ones(), 3);
        }
    }

    proptest! {
        #[test]
        fn prop_test_signature_bijection(seq in "[ACGT]{1,14}") {
            let codec = TwobitCodec::default();
            let sign = codec.signature(seq.as_bytes()).unwrap();
            assert!(sign < 1 << (2 * seq.len()));
            assert_eq!(codec.unsignature(sign, seq.len()), seq.as_bytes());
        }
    }
}
