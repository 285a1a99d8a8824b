// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC GlobalId (compressed GUID)
//!
//! A GlobalId is a 128-bit UUID written as 22 characters of the IFC base-64
//! alphabet: the first character carries the top 2 bits, the remaining 21
//! carry 6 bits each.

use uuid::Uuid;

const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Length of a compressed GlobalId
pub const GLOBAL_ID_LEN: usize = 22;

/// Compress a UUID into its 22-character GlobalId form
pub fn compress(uuid: &Uuid) -> String {
    let n = uuid.as_u128();
    let mut out = String::with_capacity(GLOBAL_ID_LEN);
    out.push(ALPHABET[((n >> 126) & 0x3) as usize] as char);
    for i in 1..GLOBAL_ID_LEN {
        let shift = 6 * (GLOBAL_ID_LEN - 1 - i);
        out.push(ALPHABET[((n >> shift) & 0x3f) as usize] as char);
    }
    out
}

/// Expand a GlobalId back into a UUID. Returns `None` for malformed input.
pub fn expand(global_id: &str) -> Option<Uuid> {
    let bytes = global_id.as_bytes();
    if bytes.len() != GLOBAL_ID_LEN {
        return None;
    }

    let mut n: u128 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let digit = ALPHABET.iter().position(|&c| c == b)? as u128;
        if i == 0 && digit > 3 {
            return None;
        }
        n = (n << 6) | digit;
    }
    Some(Uuid::from_u128(n))
}

/// Fresh random GlobalId
pub fn new_global_id() -> String {
    compress(&Uuid::new_v4())
}
