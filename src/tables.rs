use crate::error::CompileError;
use crate::glyph::Glyph;
use log::{debug, info};
use std::collections::BTreeMap;

pub const SPACE: u8 = b' ';

/// Hard target-memory constraint: each selector must fit in one byte's
/// worth of bits in the packed index field.
pub const MAX_SELECTOR_BITS: u32 = 8;

/// One stored table slot. `code` is `None` for the synthetic blank that
/// leads the narrowest table.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub code: Option<u8>,
    pub columns: Vec<u8>,
}

/// All glyphs sharing one bounding-box width. After layout the table's
/// position equals its width, so the id needs no separate storage.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    pub width: usize,
    pub entries: Vec<TableEntry>,
}

impl GlyphTable {
    #[inline(always)]
    pub fn data_len(&self) -> usize {
        self.entries.len() * self.width
    }

    /// Serialized column bytes, entries concatenated in slot order.
    pub fn data(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_len());
        for e in &self.entries {
            out.extend_from_slice(&e.columns);
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphSlot {
    pub table_id: u8,
    pub index: u16,
}

/// Immutable result of grouping and layout, consumed by the packer and the
/// blob assembler.
#[derive(Debug)]
pub struct FontLayout {
    /// Dense over widths: `tables[w].width == w` for every `w`.
    pub tables: Vec<GlyphTable>,
    /// Character code -> slot, covering `[first_glyph, last_glyph]`.
    pub index: BTreeMap<u8, GlyphSlot>,
    pub first_glyph: u8,
    pub last_glyph: u8,
    pub table_bits: u32,
    pub index_bits: u32,
}

impl FontLayout {
    #[inline(always)]
    pub fn pair_bits(&self) -> u32 {
        self.table_bits + self.index_bits
    }

    #[inline(always)]
    pub fn code_count(&self) -> usize {
        usize::from(self.last_glyph - self.first_glyph) + 1
    }
}

/// Minimal bits to select one of `n` values: `ceil(log2(n))`, 0 when there
/// is nothing to choose.
#[inline(always)]
fn selector_bits(n: usize) -> u32 {
    if n <= 1 { 0 } else { (n - 1).ilog2() + 1 }
}

/// Rejects selector counts the one-byte packed field cannot carry. A count
/// of 256 already fails: the index field must stay strictly below the
/// 8-bit ceiling, and representing the count itself takes 9 bits.
fn check_selector_widths(
    table_count: usize,
    max_entries: usize,
) -> Result<(u32, u32), CompileError> {
    if table_count > 0xff {
        return Err(CompileError::BitWidthOverflow(format!(
            "{table_count} tables need a {}-bit selector, at most {MAX_SELECTOR_BITS} fit",
            table_count.ilog2() + 1
        )));
    }
    if max_entries > 0xff {
        return Err(CompileError::BitWidthOverflow(format!(
            "widest table holds {max_entries} entries, needing a {}-bit selector, at most {MAX_SELECTOR_BITS} fit",
            max_entries.ilog2() + 1
        )));
    }
    Ok((selector_bits(table_count), selector_bits(max_entries)))
}

/// Groups glyphs by bounding-box width and plans the table layout: one
/// table per width in `[0, max_width]` sorted ascending (so table id equals
/// glyph width), the synthetic blank at index 0 of the narrowest populated
/// table, space aliasing for unmapped codes, and the selector bit-widths.
pub fn plan_layout(glyphs: &[Glyph]) -> Result<FontLayout, CompileError> {
    if !glyphs.iter().any(|g| g.code() == SPACE) {
        return Err(CompileError::MissingSpaceGlyph);
    }

    let mut groups: BTreeMap<usize, Vec<&Glyph>> = BTreeMap::new();
    for g in glyphs.iter().filter(|g| !g.is_empty()) {
        groups.entry(g.bounds().width).or_default().push(g);
    }
    for group in groups.values_mut() {
        group.sort(); // by character code
    }
    let Some((&narrowest, _)) = groups.first_key_value() else {
        return Err(CompileError::MalformedAtlas(
            "atlas contains no filled pixels, nothing to compile".into(),
        ));
    };
    let max_width = *groups.keys().last().expect("groups checked non-empty");

    // One table per width keeps the id space contiguous; an absent width
    // stays an empty placeholder.
    let mut tables: Vec<GlyphTable> = (0..=max_width)
        .map(|width| GlyphTable {
            width,
            entries: Vec::new(),
        })
        .collect();

    // Index 0 of the narrowest table is always a renderable blank, and the
    // space character resolves to it no matter where its own cell sorted.
    let mut index: BTreeMap<u8, GlyphSlot> = BTreeMap::new();
    tables[narrowest].entries.push(TableEntry {
        code: None,
        columns: vec![0; narrowest],
    });
    index.insert(
        SPACE,
        GlyphSlot {
            table_id: narrowest as u8,
            index: 0,
        },
    );

    for (&width, group) in &groups {
        for g in group {
            let table = &mut tables[width];
            let slot = GlyphSlot {
                table_id: width as u8,
                index: table.entries.len() as u16,
            };
            // Space keeps its synthetic mapping even when its cell has ink.
            index.entry(g.code()).or_insert(slot);
            table.entries.push(TableEntry {
                code: Some(g.code()),
                columns: g.box_columns(),
            });
        }
        debug!("table {width}px: {} glyphs", group.len());
    }

    let first_glyph = *index.keys().next().expect("space is always mapped");
    let last_glyph = *index.keys().last().expect("space is always mapped");

    // Back-fill codes with no glyph of their own by aliasing to the space
    // slot. The range is half-open, matching the reference scan; the code at
    // exactly last_glyph always owns a native glyph, so nothing is lost.
    let space_slot = index[&SPACE];
    for code in first_glyph..last_glyph {
        index.entry(code).or_insert(space_slot);
    }

    let max_entries = tables.iter().map(|t| t.entries.len()).max().unwrap_or(0);
    let (table_bits, index_bits) = check_selector_widths(tables.len(), max_entries)?;

    info!(
        "layout: {} tables (widths 0..={max_width}), codes 0x{first_glyph:02x}..=0x{last_glyph:02x}, {table_bits}+{index_bits} selector bits",
        tables.len()
    );

    Ok(FontLayout {
        tables,
        index,
        first_glyph,
        last_glyph,
        table_bits,
        index_bits,
    })
}
