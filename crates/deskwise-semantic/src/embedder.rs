//! Word-vector sentence embedder.
//!
//! Loads a `DWV1` vector table with mmap and averages token vectors into a
//! normalized sentence embedding. Out-of-vocabulary tokens get a
//! deterministic hash-bucketed vector so two phrasings of an unknown term
//! still land near each other.
//!
//! ## File format (little-endian)
//! ```text
//! magic   [u8; 4]  = "DWV1"
//! version u32      = 1
//! vocab   u32      number of tokens
//! dim     u32      vector dimension
//! tokens  vocab × (u16 len + utf-8 bytes)
//! vectors vocab × dim × f16, row-major, in token order
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use half::f16;
use memmap2::Mmap;

use deskwise_core::error::{DeskwiseError, Result};
use deskwise_match::significant_tokens;

const MAGIC: &[u8; 4] = b"DWV1";
const VERSION: u32 = 1;

/// Sentence embedding contract. The index only sees this trait, so tests
/// and alternative backends can swap the implementation.
pub trait Embedder: Send + Sync {
    fn encode(&self, text: &str) -> Result<Vec<f32>>;
    fn dimension(&self) -> usize;
}

/// Memory-mapped word-vector table.
#[derive(Debug)]
pub struct WordVecEmbedder {
    mmap: Mmap,
    vocab: HashMap<String, usize>,
    dim: usize,
    vectors_offset: usize,
}

impl WordVecEmbedder {
    /// Load a vector table. Any inconsistency (missing file, bad magic,
    /// truncated data) is an initialization failure — the caller degrades
    /// to the lexical tier instead of crashing.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            DeskwiseError::EmbeddingUnavailable(format!(
                "Cannot open model {}: {e}",
                path.display()
            ))
        })?;
        // Read-only map; the file is never mutated while the process runs.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
            DeskwiseError::EmbeddingUnavailable(format!("Cannot map model: {e}"))
        })?;

        let mut cursor = &mmap[..];
        let mut magic = [0u8; 4];
        cursor
            .read_exact(&mut magic)
            .map_err(|e| DeskwiseError::EmbeddingUnavailable(format!("Truncated header: {e}")))?;
        if &magic != MAGIC {
            return Err(DeskwiseError::EmbeddingUnavailable(
                "Bad magic — not a DWV1 vector table".into(),
            ));
        }
        let version = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| DeskwiseError::EmbeddingUnavailable(format!("Truncated header: {e}")))?;
        if version != VERSION {
            return Err(DeskwiseError::EmbeddingUnavailable(format!(
                "Unsupported DWV version: {version}"
            )));
        }
        let vocab_size = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| DeskwiseError::EmbeddingUnavailable(format!("Truncated header: {e}")))?
            as usize;
        let dim = cursor
            .read_u32::<LittleEndian>()
            .map_err(|e| DeskwiseError::EmbeddingUnavailable(format!("Truncated header: {e}")))?
            as usize;
        if dim == 0 || vocab_size == 0 {
            return Err(DeskwiseError::EmbeddingUnavailable(
                "Empty vocabulary or zero dimension".into(),
            ));
        }

        let mut vocab = HashMap::with_capacity(vocab_size);
        let mut offset = 4 + 4 + 4 + 4;
        for row in 0..vocab_size {
            let len = cursor.read_u16::<LittleEndian>().map_err(|e| {
                DeskwiseError::EmbeddingUnavailable(format!("Truncated vocab: {e}"))
            })? as usize;
            let mut token = vec![0u8; len];
            cursor.read_exact(&mut token).map_err(|e| {
                DeskwiseError::EmbeddingUnavailable(format!("Truncated vocab: {e}"))
            })?;
            let token = String::from_utf8(token).map_err(|e| {
                DeskwiseError::EmbeddingUnavailable(format!("Invalid vocab token: {e}"))
            })?;
            vocab.insert(token, row);
            offset += 2 + len;
        }

        let expected = offset + vocab_size * dim * 2;
        if mmap.len() < expected {
            return Err(DeskwiseError::EmbeddingUnavailable(format!(
                "Truncated vector data: {} < {expected} bytes",
                mmap.len()
            )));
        }

        tracing::info!(
            "🧠 Vector table loaded: {vocab_size} tokens, dim={dim}, {:.1} MB",
            mmap.len() as f64 / 1024.0 / 1024.0
        );

        Ok(Self {
            mmap,
            vocab,
            dim,
            vectors_offset: offset,
        })
    }

    fn row(&self, index: usize) -> Vec<f32> {
        let start = self.vectors_offset + index * self.dim * 2;
        let bytes = &self.mmap[start..start + self.dim * 2];
        bytes
            .chunks_exact(2)
            .map(|b| f16::from_le_bytes([b[0], b[1]]).to_f32())
            .collect()
    }

    /// Deterministic pseudo-vector for an out-of-vocabulary token:
    /// FNV-1a seed, xorshift fill, unit length.
    fn oov_vector(&self, token: &str) -> Vec<f32> {
        let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
        for b in token.bytes() {
            seed ^= b as u64;
            seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let mut state = seed.max(1);
        let mut v = Vec::with_capacity(self.dim);
        for _ in 0..self.dim {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            // Map to [-1, 1)
            v.push((state as f32 / u64::MAX as f32) * 2.0 - 1.0);
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Embedder for WordVecEmbedder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = significant_tokens(text);
        if tokens.is_empty() {
            return Ok(vec![0.0; self.dim]);
        }
        let mut sum = vec![0.0f32; self.dim];
        for token in &tokens {
            let v = match self.vocab.get(token) {
                Some(&row) => self.row(row),
                None => self.oov_vector(token),
            };
            for (s, x) in sum.iter_mut().zip(v.iter()) {
                *s += x;
            }
        }
        let count = tokens.len() as f32;
        for s in &mut sum {
            *s /= count;
        }
        let norm = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for s in &mut sum {
                *s /= norm;
            }
        }
        Ok(sum)
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    /// Write a tiny valid DWV1 table to a per-test temp file.
    fn write_table(tag: &str, tokens: &[(&str, &[f32])]) -> std::path::PathBuf {
        let dim = tokens[0].1.len();
        let path = std::env::temp_dir().join(format!(
            "deskwise-dwv-{tag}-{}.dwv",
            std::process::id()
        ));
        let mut buf = Vec::new();
        buf.write_all(MAGIC).unwrap();
        buf.write_u32::<LittleEndian>(VERSION).unwrap();
        buf.write_u32::<LittleEndian>(tokens.len() as u32).unwrap();
        buf.write_u32::<LittleEndian>(dim as u32).unwrap();
        for (token, _) in tokens {
            buf.write_u16::<LittleEndian>(token.len() as u16).unwrap();
            buf.write_all(token.as_bytes()).unwrap();
        }
        for (_, vec) in tokens {
            for x in *vec {
                buf.write_all(&f16::from_f32(*x).to_le_bytes()).unwrap();
            }
        }
        std::fs::write(&path, buf).unwrap();
        path
    }

    #[test]
    fn missing_file_fails_init() {
        let err = WordVecEmbedder::load(Path::new("/nonexistent/model.dwv")).unwrap_err();
        assert!(matches!(err, DeskwiseError::EmbeddingUnavailable(_)));
    }

    #[test]
    fn bad_magic_fails_init() {
        let path = std::env::temp_dir().join(format!("deskwise-badmagic-{}", std::process::id()));
        std::fs::write(&path, b"NOPE000000000000").unwrap();
        assert!(WordVecEmbedder::load(&path).is_err());
    }

    #[test]
    fn known_tokens_round_trip() {
        let path = write_table("roundtrip", &[
            ("conge", &[1.0, 0.0, 0.0, 0.0]),
            ("rapport", &[0.0, 1.0, 0.0, 0.0]),
        ]);
        let embedder = WordVecEmbedder::load(&path).unwrap();
        assert_eq!(embedder.dimension(), 4);

        let v = embedder.encode("congé").unwrap();
        assert!((v[0] - 1.0).abs() < 0.01, "accent folds to vocab token: {v:?}");

        // Same text twice encodes identically.
        assert_eq!(embedder.encode("rapport").unwrap(), embedder.encode("rapport").unwrap());
    }

    #[test]
    fn oov_is_deterministic_and_nonzero() {
        let path = write_table("oov", &[("conge", &[1.0, 0.0, 0.0, 0.0])]);
        let embedder = WordVecEmbedder::load(&path).unwrap();
        let a = embedder.encode("blockchain").unwrap();
        let b = embedder.encode("blockchain").unwrap();
        assert_eq!(a, b);
        assert!(a.iter().any(|x| x.abs() > 0.0));
    }

    #[test]
    fn punctuation_only_encodes_to_zero() {
        let path = write_table("punct", &[("conge", &[1.0, 0.0])]);
        let embedder = WordVecEmbedder::load(&path).unwrap();
        let v = embedder.encode("?!").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
