use crate::tables::FontLayout;

/// Compile-time constants a consumer needs alongside the blob. These are
/// what the emitter turns into `#define` lines.
#[derive(Debug, Clone, Copy)]
pub struct FontParams {
    pub first_glyph: u8,
    pub last_glyph: u8,
    pub table_bits: u32,
    pub index_bits: u32,
    /// Byte offset of the index table, i.e. the directory size.
    pub index_offset: usize,
}

impl FontParams {
    pub fn from_layout(layout: &FontLayout) -> Self {
        Self {
            first_glyph: layout.first_glyph,
            last_glyph: layout.last_glyph,
            table_bits: layout.table_bits,
            index_bits: layout.index_bits,
            index_offset: layout.tables.len() * 2,
        }
    }

    #[inline(always)]
    pub fn pair_bits(&self) -> u32 {
        self.table_bits + self.index_bits
    }

    #[inline(always)]
    pub fn table_mask(&self) -> u8 {
        ((1u16 << self.table_bits) - 1) as u8
    }

    #[inline(always)]
    pub fn index_mask(&self) -> u8 {
        ((1u16 << self.index_bits) - 1) as u8
    }
}

/// The assembled font artifact: directory, packed index and glyph data in
/// one offset-addressed region. Immutable once built; every consumer reads
/// the same bytes the emitter prints.
#[derive(Debug)]
pub struct FontBlob {
    /// Table-data byte offset per table id, relative to the region start.
    /// Zero for the width-0 placeholder.
    pub directory: Vec<u16>,
    pub index_table: Vec<u8>,
    pub glyph_data: Vec<u8>,
    bytes: Vec<u8>,
}

impl FontBlob {
    #[inline(always)]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total region size including the optional even-boundary pad byte.
    #[inline(always)]
    pub fn total_len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether an even-boundary pad byte was appended.
    #[inline(always)]
    pub fn is_padded(&self) -> bool {
        self.bytes.len()
            != self.directory.len() * 2 + self.index_table.len() + self.glyph_data.len()
    }
}

/// Lays the region out as directory, index table, then per-table glyph data
/// in table-id order. Directory offsets accumulate over the data regions,
/// skipping the width-0 placeholder; the whole region is padded to an even
/// length with a zero byte.
pub fn assemble(layout: &FontLayout, index_table: Vec<u8>) -> FontBlob {
    let dir_len = layout.tables.len() * 2;
    let mut offset = dir_len + index_table.len();
    let mut directory = Vec::with_capacity(layout.tables.len());
    let mut glyph_data = Vec::new();
    for table in &layout.tables {
        if table.width == 0 {
            directory.push(0);
        } else {
            directory.push(offset as u16);
            offset += table.data_len();
        }
        glyph_data.extend(table.data());
    }

    let mut bytes = Vec::with_capacity(offset + 1);
    for &entry in &directory {
        bytes.extend_from_slice(&entry.to_le_bytes());
    }
    bytes.extend_from_slice(&index_table);
    bytes.extend_from_slice(&glyph_data);
    if bytes.len() % 2 != 0 {
        bytes.push(0);
    }

    FontBlob {
        directory,
        index_table,
        glyph_data,
        bytes,
    }
}

/// The lookup every consumer of the blob must implement: resolves a
/// character code to the byte address and pixel width of its glyph columns.
/// Returns `None` outside `[first_glyph, last_glyph]`; the caller decides
/// what a missing glyph means. Stateless and reentrant — the blob never
/// changes after assembly. Pointer arithmetic is 16-bit, as on the target.
pub fn lookup(blob: &[u8], params: &FontParams, code: u8) -> Option<(u16, u8)> {
    if code < params.first_glyph || code > params.last_glyph {
        return None;
    }

    let pair_bits = params.pair_bits() as usize;
    let idx = usize::from(code - params.first_glyph);
    let bit_offset = idx * pair_bits;
    let byte_index = bit_offset / 8;
    let bit_shift = bit_offset % 8;

    // Minimal byte run fully containing the pair. Bits past the stream read
    // as zero, like trailing pad bits in flash.
    let nbytes = (bit_shift + pair_bits).div_ceil(8);
    let mut acc = 0u32;
    for i in 0..nbytes {
        let byte = blob
            .get(params.index_offset + byte_index + i)
            .copied()
            .unwrap_or(0);
        acc = (acc << 8) | u32::from(byte);
    }
    let pair = if pair_bits == 0 {
        0
    } else {
        (acc >> (nbytes * 8 - bit_shift - pair_bits)) & ((1u32 << pair_bits) - 1)
    };

    let table_id = (pair & u32::from(params.table_mask())) as u8;
    let index = ((pair >> params.table_bits) & u32::from(params.index_mask())) as u16;

    let dir_at = usize::from(table_id) * 2;
    let table_base = u16::from_le_bytes([*blob.get(dir_at)?, *blob.get(dir_at + 1)?]);
    let address = table_base.wrapping_add(index.wrapping_mul(u16::from(table_id)));
    Some((address, table_id))
}
