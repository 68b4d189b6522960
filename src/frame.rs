//! Length-prefixed, zero-padded framing of plaintext (§4.4, "Framing").
//!
//! `frame(bytes)` emits `[length:u32 LE][payload][0x00 padding]` where the
//! total size is the next multiple of 64. `deframe` is its inverse and
//! rejects frames whose length field would read past the buffer.

use crate::error::VaultError;

/// Byte alignment the frame's total length is padded to.
pub const FRAME_ALIGNMENT: usize = 64;
/// Size of the little-endian length prefix.
const LEN_PREFIX: usize = 4;

/// Frames `payload`: `[u32 LE length][payload][zero padding]`, total length a
/// multiple of `FRAME_ALIGNMENT`.
pub fn frame(payload: &[u8]) -> Vec<u8> {
  let unpadded_len = LEN_PREFIX + payload.len();
  let padded_len = unpadded_len.div_ceil(FRAME_ALIGNMENT) * FRAME_ALIGNMENT;

  let mut out = Vec::with_capacity(padded_len);
  out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
  out.extend_from_slice(payload);
  out.resize(padded_len, 0u8);
  out
}

/// Deframes `bytes` back to its payload.
///
/// Rejects with `VaultError::CorruptFrame` if fewer than 4 bytes are
/// present, or if the encoded length would read past the end of `bytes`.
pub fn deframe(bytes: &[u8]) -> Result<Vec<u8>, VaultError> {
  if bytes.len() < LEN_PREFIX {
    return Err(VaultError::CorruptFrame("frame shorter than length prefix".to_string()));
  }
  let mut len_bytes = [0u8; LEN_PREFIX];
  len_bytes.copy_from_slice(&bytes[..LEN_PREFIX]);
  let length = u32::from_le_bytes(len_bytes) as usize;

  if length.checked_add(LEN_PREFIX).map_or(true, |end| end > bytes.len()) {
    return Err(VaultError::CorruptFrame(format!(
      "length field {length} exceeds available payload"
    )));
  }

  Ok(bytes[LEN_PREFIX..LEN_PREFIX + length].to_vec())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn framed_length_is_64_aligned() {
    for len in [0usize, 1, 10, 60, 63, 64, 65, 1000] {
      let payload = vec![0xABu8; len];
      let framed = frame(&payload);
      assert_eq!(framed.len() % FRAME_ALIGNMENT, 0);
    }
  }

  #[test]
  fn roundtrip_for_arbitrary_lengths() {
    for len in [0usize, 1, 10, 60, 63, 64, 65, 1000, 4000] {
      let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
      let framed = frame(&payload);
      let deframed = deframe(&framed).unwrap();
      assert_eq!(deframed, payload);
    }
  }

  #[test]
  fn padding_bytes_are_zero() {
    let payload = b"hi";
    let framed = frame(payload);
    assert!(framed[4 + payload.len()..].iter().all(|&b| b == 0));
  }

  #[test]
  fn overlong_length_field_is_corrupt_frame() {
    let mut buf = vec![0u8; 64];
    buf[0..4].copy_from_slice(&(u32::MAX).to_le_bytes());
    assert!(matches!(deframe(&buf), Err(VaultError::CorruptFrame(_))));
  }

  #[test]
  fn too_short_for_length_prefix_is_corrupt_frame() {
    assert!(matches!(deframe(&[1, 2]), Err(VaultError::CorruptFrame(_))));
  }
}
