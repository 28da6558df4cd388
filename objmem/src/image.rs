//! Image loading.
//!
//! An image is a snapshot of the object table and the object space:
//!
//! ```text
//! magic      8 bytes, "STOBJIMG"
//! version    u32
//! table_len  u32
//! entries    table_len * (pos u32, packed u32)
//! space_len  u32
//! space      space_len raw bytes
//! ```
//!
//! Integers are little-endian. A free table entry is serialized with
//! pos = 0xFFFF_FFFF. The loader validates the whole table against
//! the space before committing anything, then partitions the loaded
//! oops into classes, metaclasses and plain objects.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::io::{self, Read};

use log::{debug, warn};

use crate::error::{MemoryError, MemoryResult};
use crate::memory::ObjectMemory;
use crate::oop::Oop;
use crate::space::{OBJECT_HEADER_BYTES, ObjectSpace, SIZE_WORD_OFFSET, padded};
use crate::table::{MAX_TABLE_ENTRIES, ObjectData, ObjectTable};

const IMAGE_MAGIC: &[u8; 8] = b"STOBJIMG";
const IMAGE_VERSION: u32 = 1;
const FREE_ENTRY_POS: u32 = 0xFFFF_FFFF;

impl ObjectMemory {
    /// Replaces the whole memory with the image read from `reader`.
    /// On any error the memory is left empty, never half-loaded.
    pub fn read_from<R: Read>(&mut self, reader: &mut R) -> MemoryResult<()> {
        self.reset();

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).map_err(stream_error)?;
        if &magic != IMAGE_MAGIC {
            return Err(MemoryError::MalformedImage { reason: "bad magic" });
        }
        let version = read_u32(reader)?;
        if version != IMAGE_VERSION {
            return Err(MemoryError::MalformedImage {
                reason: "unsupported version",
            });
        }

        let table_len = read_u32(reader)? as usize;
        if table_len > MAX_TABLE_ENTRIES {
            return Err(MemoryError::MalformedImage {
                reason: "table larger than the oop space",
            });
        }
        let mut entries = Vec::with_capacity(table_len);
        for _ in 0..table_len {
            let pos = read_u32(reader)?;
            let packed = read_u32(reader)?;
            if pos == FREE_ENTRY_POS {
                entries.push(None);
            } else {
                entries.push(Some(ObjectData::unpack(pos, packed)));
            }
        }

        let space_len = read_u32(reader)? as usize;
        let mut bytes = vec![0u8; space_len];
        reader.read_exact(&mut bytes).map_err(stream_error)?;
        let space = ObjectSpace::from_bytes(bytes);

        validate(&entries, &space)?;

        self.table = ObjectTable::from_entries(entries);
        self.space = space;
        self.classify();

        debug!(
            "loaded image: {} objects in {} space bytes, {} classes, {} metaclasses",
            self.table.used_count(),
            self.space.len(),
            self.classes.len(),
            self.metaclasses.len()
        );
        Ok(())
    }

    // The Metaclass is found structurally: it is an instance of one of
    // its own instances, and of the two objects in that cycle it is
    // the one with more instances overall.
    fn classify(&mut self) {
        let oops = self.all_valid_oops();

        let mut instance_counts: HashMap<Oop, usize> = HashMap::new();
        for &oop in &oops {
            if let Ok(class) = self.class_of(oop) {
                *instance_counts.entry(class).or_insert(0) += 1;
            }
        }

        let candidates: Vec<Oop> = oops
            .iter()
            .copied()
            .filter(|&oop| {
                let Ok(class) = self.class_of(oop) else {
                    return false;
                };
                class != oop && self.class_of(class) == Ok(oop)
            })
            .collect();
        if candidates.len() != 2 {
            warn!(
                "found {} metaclass candidates instead of two",
                candidates.len()
            );
        }
        let Some(metaclass) = candidates.iter().copied().max_by_key(|&oop| {
            (
                instance_counts.get(&oop).copied().unwrap_or(0),
                Reverse(oop),
            )
        }) else {
            self.objects = oops.into_iter().collect();
            return;
        };

        let mut metaclasses = HashSet::new();
        for &oop in &oops {
            if self.class_of(oop) == Ok(metaclass) {
                metaclasses.insert(oop);
            }
        }

        let mut classes = HashSet::new();
        let mut objects = HashSet::new();
        for &oop in &oops {
            if metaclasses.contains(&oop) {
                continue;
            }
            match self.class_of(oop) {
                Ok(class) if metaclasses.contains(&class) => {
                    classes.insert(oop);
                }
                _ => {
                    objects.insert(oop);
                }
            }
        }

        self.metaclasses = metaclasses;
        self.classes = classes;
        self.objects = objects;
    }
}

fn validate(entries: &[Option<ObjectData>], space: &ObjectSpace) -> MemoryResult<()> {
    if entries.first().is_some_and(|entry| entry.is_some()) {
        return Err(MemoryError::MalformedImage {
            reason: "table entry 0 is not free",
        });
    }
    let mut spans = Vec::new();
    for entry in entries.iter().flatten() {
        if entry.pos & 1 != 0 {
            return Err(MemoryError::MalformedImage {
                reason: "object not word-aligned",
            });
        }
        if entry.len > u16::MAX as u32 {
            return Err(MemoryError::MalformedImage {
                reason: "object length exceeds the 16-bit budget",
            });
        }
        if entry.is_ptr && entry.len & 1 != 0 {
            return Err(MemoryError::MalformedImage {
                reason: "pointer object with odd length",
            });
        }
        let end =
            entry.pos as u64 + OBJECT_HEADER_BYTES as u64 + padded(entry.len) as u64;
        if end > space.len() as u64 {
            return Err(MemoryError::MalformedImage {
                reason: "object extends past the space",
            });
        }
        if space.read_word(entry.pos + SIZE_WORD_OFFSET) as u32 != entry.len {
            return Err(MemoryError::MalformedImage {
                reason: "size word disagrees with the table",
            });
        }
        spans.push((entry.pos, end as u32));
    }
    spans.sort_unstable();
    for pair in spans.windows(2) {
        if pair[0].1 > pair[1].0 {
            return Err(MemoryError::MalformedImage {
                reason: "overlapping objects",
            });
        }
    }
    Ok(())
}

fn stream_error(error: io::Error) -> MemoryError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        MemoryError::MalformedImage {
            reason: "truncated stream",
        }
    } else {
        MemoryError::MalformedImage {
            reason: "stream read failed",
        }
    }
}

fn read_u32(r: &mut dyn Read) -> MemoryResult<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).map_err(stream_error)?;
    Ok(u32::from_le_bytes(b))
}
