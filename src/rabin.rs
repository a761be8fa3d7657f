// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Implementation of the Rabin fingerprint algorithm, the 64-bit fingerprint
//! the [Avro specification](https://avro.apache.org/docs/++version++/specification/#schema-fingerprints)
//! recommends for schema identification.

use digest::{
    FixedOutput, FixedOutputReset, HashMarker, Output, OutputSizeUser, Reset, Update, consts::U8,
};
use std::sync::OnceLock;

/// The seed, which is also the CRC-64-AVRO polynomial.
const EMPTY: i64 = 0xc15d213aa4d7a795_u64 as i64;

fn fp_table() -> &'static [i64; 256] {
    static FPTABLE_ONCE: OnceLock<[i64; 256]> = OnceLock::new();
    FPTABLE_ONCE.get_or_init(|| {
        let mut fp_table: [i64; 256] = [0; 256];
        for i in 0..256 {
            let mut fp = i;
            for _ in 0..8 {
                fp = ((fp as u64) >> 1) as i64 ^ (EMPTY & -(fp & 1));
            }
            fp_table[i as usize] = fp;
        }
        fp_table
    })
}

/// A [`digest::Digest`] producing the 64-bit CRC-64-AVRO Rabin fingerprint.
///
/// The finalized output is the fingerprint in little-endian byte order, as
/// used by the Avro single-object encoding.
#[derive(Clone, Debug)]
pub struct Rabin {
    result: i64,
}

impl Default for Rabin {
    fn default() -> Self {
        Rabin { result: EMPTY }
    }
}

impl Rabin {
    /// The fingerprint accumulated so far, as an unsigned 64-bit value.
    pub fn as_u64(&self) -> u64 {
        self.result as u64
    }
}

impl Update for Rabin {
    fn update(&mut self, data: &[u8]) {
        let table = fp_table();
        for b in data {
            self.result = ((self.result as u64) >> 8) as i64
                ^ table[((self.result ^ *b as i64) & 0xff) as usize];
        }
    }
}

impl FixedOutput for Rabin {
    fn finalize_into(self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
    }
}

impl OutputSizeUser for Rabin {
    type OutputSize = U8;
}

impl Reset for Rabin {
    fn reset(&mut self) {
        self.result = EMPTY;
    }
}

impl FixedOutputReset for Rabin {
    fn finalize_into_reset(&mut self, out: &mut Output<Self>) {
        out.copy_from_slice(&self.result.to_le_bytes());
        self.reset();
    }
}

impl HashMarker for Rabin {}

#[cfg(test)]
mod tests {
    use super::Rabin;
    use digest::Digest;
    use pretty_assertions::assert_eq;

    // Test vectors taken from the reference implementations shipped with the
    // Avro specification.
    #[test]
    fn test_rabin_fingerprints() {
        let data: &[(&str, i64)] = &[
            (r#""null""#, 7195948357588979594),
            (r#""boolean""#, -6970731678124411036),
            (
                r#"{"name":"foo","type":"fixed","size":15}"#,
                1756455273707447556,
            ),
            (
                r#"{"name":"myrecord","type":"record","fields":[{"name":"f1","type":"string"}]}"#,
                7843277075252814651,
            ),
        ];

        for (s, fp) in data {
            let mut hasher = Rabin::new();
            hasher.update(s.as_bytes());
            let result = i64::from_le_bytes(hasher.finalize().as_slice().try_into().unwrap());
            assert_eq!(*fp, result, "fingerprint mismatch for {s}");
        }
    }

    #[test]
    fn test_reset() {
        let mut hasher = Rabin::default();
        digest::Update::update(&mut hasher, b"something");
        digest::Reset::reset(&mut hasher);
        digest::Update::update(&mut hasher, br#""null""#);
        assert_eq!(hasher.as_u64() as i64, 7195948357588979594);
    }
}
