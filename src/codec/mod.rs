//! Packed value codecs for Waters `_FUNCxxx.DAT` payloads.
//!
//! Three incompatible encodings exist and one is chosen per function by probing
//! (see [`crate::raw`]):
//!
//! | Variant | Point size | Intensity | m/z |
//! |---------|-----------|-----------|-----|
//! | Type1 | 8 (12 with calibration word) | scale + mantissa word | Type1 band table |
//! | Type1-6 | 6 | `u16` x 4^nibble | 24-bit fixed point, rescaled to Type1 |
//! | V3C | 12 | lookup-table word | Type1 band table |
//!
//! All functions here are pure. Decoding always normalizes to a Type1 pair
//! ([`PackedPoint`]) so that calibration and centroiding see one representation.
//!
//! # Example
//!
//! ```
//! use pico::codec::{decode_mz_type1, encode_mz_type1, decode_intensity_type1, encode_intensity_type1};
//!
//! let word = encode_mz_type1(445.12);
//! assert!((decode_mz_type1(word) - 445.12).abs() < 1e-3);
//!
//! assert_eq!(decode_intensity_type1(encode_intensity_type1(1234)), 1234);
//! ```

mod error;
mod intensity;
mod mz;
mod record;
mod v3c;
mod zeros;


pub use error::CodecError;
pub use intensity::{
    band_base, decode_in_quarter, decode_intensity_type1, decode_intensity_type1_raw,
    encode_intensity_type1, intensity_step, round_intensity, split_word, MAX_SUPPORTED_SCALE,
    QUARTER_OFFSETS, QUARTER_SPAN,
};
pub use mz::{
    decode_mz_type1, decode_mz_type1_6, decode_mz_type1_6_v3c, encode_mz_type1,
    recode_mz_type1_6, recode_mz_type1_6_v3c, try_decode_mz_type1, MzBand, MZ_BANDS, MZ_CEILING,
    MZ_FLOOR, MZ_WORD_MAX, MZ_WORD_MIN,
};
pub use record::{PackedPoint, PointLayout, TYPE1_6_FACTORS};
pub use v3c::{recode_intensity_type1_v3c, V3cTable, V3C_TABLE_LEN};
pub use zeros::{mz_index, ZeroModel, MAX_MZ_INDEX, MIN_MZ_INDEX};
