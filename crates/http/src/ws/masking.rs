//! Payload masking as defined by RFC 6455, section 5.3.

const MASK_BLOCK: usize = 32;

/// XORs `payload` with `mask`, starting at key byte `phase`.
///
/// Returns the phase to continue with for the next part of the same frame,
/// so a payload can be (un)masked in arbitrary pieces.
pub(crate) fn apply_mask(mask: [u8; 4], payload: &mut [u8], phase: usize) -> usize {
    let mut block = [0u8; MASK_BLOCK];
    for (i, b) in block.iter_mut().enumerate() {
        *b = mask[(i + phase) % 4];
    }

    let mut chunks = payload.chunks_exact_mut(MASK_BLOCK);
    for chunk in &mut chunks {
        for (b, m) in chunk.iter_mut().zip(block) {
            *b ^= m;
        }
    }
    for (b, m) in chunks.into_remainder().iter_mut().zip(block) {
        *b ^= m;
    }

    (phase + payload.len()) % 4
}
