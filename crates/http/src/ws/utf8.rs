use std::str;

/// Validates UTF-8 text that arrives in arbitrary pieces.
///
/// A code point split across pieces is kept until it is complete, so at most
/// three bytes are held at any time.
#[derive(Debug, Default)]
pub(crate) struct Utf8Validator {
    pending: [u8; 4],
    pending_len: usize,
}

impl Utf8Validator {
    /// Checks the next piece; `false` once the text cannot be valid UTF-8.
    pub(crate) fn feed(&mut self, mut bytes: &[u8]) -> bool {
        while self.pending_len > 0 {
            let Some((&first, rest)) = bytes.split_first() else {
                return true;
            };
            self.pending[self.pending_len] = first;
            self.pending_len += 1;
            bytes = rest;
            match str::from_utf8(&self.pending[..self.pending_len]) {
                Ok(_) => self.pending_len = 0,
                Err(e) if e.error_len().is_some() => return false,
                Err(_) => {}
            }
        }

        match str::from_utf8(bytes) {
            Ok(_) => true,
            Err(e) if e.error_len().is_some() => false,
            Err(e) => {
                let tail = &bytes[e.valid_up_to()..];
                self.pending[..tail.len()].copy_from_slice(tail);
                self.pending_len = tail.len();
                true
            }
        }
    }

    /// Ends the text; `false` if it stopped inside a code point. Resets the validator.
    pub(crate) fn finish(&mut self) -> bool {
        let complete = self.pending_len == 0;
        self.pending_len = 0;
        complete
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn accepts_code_point_split_across_pieces() {
        let text = "grüße €".as_bytes();
        let mut validator = Utf8Validator::default();
        for b in text {
            assert!(validator.feed(std::slice::from_ref(b)));
        }
        assert!(validator.finish());
    }

    #[test]
    fn rejects_invalid_bytes() {
        let mut validator = Utf8Validator::default();
        assert!(!validator.feed(&[b'a', 0xff]));

        let mut validator = Utf8Validator::default();
        assert!(validator.feed(&[0xe2, 0x82]));
        assert!(!validator.feed(&[b'a']));
    }

    #[test]
    fn rejects_truncated_text() {
        let mut validator = Utf8Validator::default();
        assert!(validator.feed(&[b'a', 0xe2, 0x82]));
        assert!(!validator.finish());
        // finish resets
        assert!(validator.feed(b"ok"));
        assert!(validator.finish());
    }

    proptest! {
        #[test]
        fn any_split_of_valid_text_is_accepted(text in "\\PC{0,40}", split in 0usize..200) {
            let bytes = text.as_bytes();
            let split = split.min(bytes.len());
            let mut validator = Utf8Validator::default();
            prop_assert!(validator.feed(&bytes[..split]));
            prop_assert!(validator.feed(&bytes[split..]));
            prop_assert!(validator.finish());
        }
    }
}
