use crate::tables::FontLayout;

/// MSB-first bitstream writer. Fields are appended into the high end of the
/// pending accumulator and whole bytes drain out as they complete, which is
/// exactly the order the target reads them back.
#[derive(Debug, Default)]
pub struct BitWriter {
    acc: u32,
    pending: u32,
    out: Vec<u8>,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the low `bits` bits of `value`. Field widths never exceed 16
    /// bits here (two 8-bit selectors), so the accumulator cannot overflow
    /// between flushes.
    pub fn push(&mut self, value: u16, bits: u32) {
        debug_assert!(bits <= 16, "selector fields are at most two bytes");
        let mask = if bits == 0 { 0 } else { (1u32 << bits) - 1 };
        self.acc = (self.acc << bits) | (u32::from(value) & mask);
        self.pending += bits;
        while self.pending >= 8 {
            self.out.push((self.acc >> (self.pending - 8)) as u8);
            self.pending -= 8;
        }
    }

    /// Byte-aligns by left-shifting the final partial byte over zero padding.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending > 0 {
            self.out.push((self.acc << (8 - self.pending)) as u8);
        }
        self.out
    }
}

/// Packs the character index: one `(tableId, indexInTable)` pair per code in
/// `[first_glyph, last_glyph]`, ascending. Each pair occupies
/// `table_bits + index_bits` bits with the in-table index in the high-order
/// bits and the table id in the low-order bits.
pub fn pack_index(layout: &FontLayout) -> Vec<u8> {
    let mut w = BitWriter::new();
    for code in layout.first_glyph..=layout.last_glyph {
        let slot = layout.index[&code];
        w.push(slot.index, layout.index_bits);
        w.push(u16::from(slot.table_id), layout.table_bits);
    }
    let out = w.finish();
    debug_assert_eq!(
        out.len(),
        (layout.code_count() * layout.pair_bits() as usize).div_ceil(8)
    );
    out
}
