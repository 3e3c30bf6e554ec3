//! Mapping between vocabulary indices and model token IDs
//!
//! The scoring model numbers its inputs with an extra `<pad>` slot that the
//! piece table does not define:
//!
//! | model id | vocabulary index |
//! |----------|------------------|
//! | 0 `<s>`   | 1 |
//! | 1 `<pad>` | none |
//! | 2 `</s>`  | 2 |
//! | 3 `<unk>` | 0 |
//! | k ≥ 4     | k − 1 |

/// External token ID as consumed by a scoring backend
pub type TokenId = u32;

/// Begin-of-sequence token ID
pub const BOS_ID: TokenId = 0;
/// Padding token ID; has no vocabulary index
pub const PAD_ID: TokenId = 1;
/// End-of-sequence token ID
pub const EOS_ID: TokenId = 2;
/// Unknown token ID
pub const UNK_ID: TokenId = 3;

/// Map a vocabulary index to its external token ID
#[inline]
pub fn to_external(index: usize) -> TokenId {
    match index {
        0 => UNK_ID,
        1 => BOS_ID,
        2 => EOS_ID,
        k => k as TokenId + 1,
    }
}

/// Map an external token ID back to a vocabulary index
///
/// Returns `None` for the padding slot. Range checking against a concrete
/// vocabulary is left to the caller.
#[inline]
pub fn to_internal(id: TokenId) -> Option<usize> {
    match id {
        BOS_ID => Some(1),
        PAD_ID => None,
        EOS_ID => Some(2),
        UNK_ID => Some(0),
        k => Some(k as usize - 1),
    }
}
