use crate::blob::{FontBlob, FontParams};
use crate::tables::FontLayout;
use std::io::{self, Write};

const DATA_LABEL: &str = "__ssd1306_font_data";

/// `.db` rows of eight items with a running item-index comment at each line
/// break, long expression lines wrapping early.
fn write_db_rows<W: Write>(out: &mut W, items: &[String]) -> io::Result<()> {
    let mut line_len = 0usize;
    for (i, item) in items.iter().enumerate() {
        if i % 8 == 0 || line_len > 79 {
            if i > 0 {
                writeln!(out, " ; 0x{i:04x}")?;
            }
            write!(out, ".db ")?;
            line_len = 4;
        }
        let sep = if i + 1 == items.len() { "" } else { ", " };
        write!(out, "{item}{sep}")?;
        line_len += item.len() + sep.len();
    }
    writeln!(out)?;
    Ok(())
}

fn write_defines<W: Write>(out: &mut W, params: &FontParams) -> io::Result<()> {
    writeln!(
        out,
        "#define __ssd1306_font_first_glyph (0x{:02x})",
        params.first_glyph
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_last_glyph (0x{:02x})",
        params.last_glyph
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_table_bits (0x{:02x})",
        params.table_bits
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_table_mask (0x{:02x})",
        params.table_mask()
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_index_bits (0x{:02x})",
        params.index_bits
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_index_mask (0x{:02x})",
        params.index_mask()
    )?;
    writeln!(
        out,
        "#define __ssd1306_font_ascii_order_glyph_map_offset (0x{:04x})",
        params.index_offset
    )?;
    Ok(())
}

/// The AVR lookup routine over the emitted table. The instruction elisions
/// mirror the pair width: a single `lpm` suffices when a pair is exactly one
/// byte, a third byte is only fetched when a pair can straddle two boundary
/// bits, and the shift-and-mask extraction only exists when pairs are not
/// byte-aligned.
fn write_routine<W: Write>(out: &mut W, params: &FontParams) -> io::Result<()> {
    out.write_all(ROUTINE_HEAD.as_bytes())?;
    if params.pair_bits() != 8 {
        writeln!(out, "\tlpm    r21, z+")?;
    }
    if params.pair_bits() > 9 {
        writeln!(out, "\tlpm    r22, z+")?;
    }
    if params.pair_bits() != 8 {
        out.write_all(ROUTINE_EXTRACT.as_bytes())?;
    }
    out.write_all(ROUTINE_TAIL.as_bytes())?;
    Ok(())
}

/// Emits the complete assembly fragment: includes, constants, the blob as
/// `.db` rows (directory entries as flash-address expressions), the lookup
/// routine and the storage summary.
pub fn emit<W: Write>(
    out: &mut W,
    layout: &FontLayout,
    blob: &FontBlob,
    params: &FontParams,
) -> io::Result<()> {
    writeln!(out, "#include \"abi.csm\"")?;
    writeln!(out, "#include \"utility_macros.csm\"")?;
    writeln!(out)?;
    writeln!(out)?;

    write_defines(out, params)?;
    writeln!(out)?;

    for (id, table) in layout.tables.iter().enumerate() {
        if table.width != 0 {
            writeln!(
                out,
                "; offset glyph width table {}px: 0x{:04x}",
                table.width, blob.directory[id]
            )?;
        }
    }

    let mut items: Vec<String> =
        Vec::with_capacity(blob.total_len() + blob.directory.len() * 2);
    for (id, &offset) in blob.directory.iter().enumerate() {
        if layout.tables[id].width == 0 {
            items.push("0x00".into());
            items.push("0x00".into());
        } else {
            items.push(format!("low(FLASH_ADDR({DATA_LABEL}) + 0x{offset:04x})"));
            items.push(format!("high(FLASH_ADDR({DATA_LABEL}) + 0x{offset:04x})"));
        }
    }
    for &b in blob.index_table.iter().chain(blob.glyph_data.iter()) {
        items.push(format!("0x{b:02x}"));
    }
    if blob.is_padded() {
        items.push("0x00".into());
    }

    writeln!(out, "{DATA_LABEL}:")?;
    write_db_rows(out, &items)?;
    writeln!(out)?;

    writeln!(out)?;
    writeln!(out)?;
    write_routine(out, params)?;

    let glyph_count = layout
        .tables
        .iter()
        .flat_map(|t| &t.entries)
        .filter(|e| e.code.is_some())
        .count();
    let pad = usize::from(blob.is_padded());
    let regions = [
        ("Glyph-width to table mapping", blob.directory.len() * 2),
        ("Character to glyph table/index mapping", blob.index_table.len()),
        ("Glyph data", blob.glyph_data.len() + pad),
        ("Total storage used", blob.total_len()),
    ];
    writeln!(out)?;
    writeln!(out)?;
    writeln!(out, "; Number of glyphs: {glyph_count}")?;
    for (name, bytes) in regions {
        writeln!(
            out,
            "; {name}: {bytes} bytes (~{:.3} bytes/glyph)",
            bytes as f64 / glyph_count as f64
        )?;
    }
    Ok(())
}

const ROUTINE_HEAD: &str = "\
; returns (in z) the address (in flash) of the first data byte
; of the requested character (r16), and the size (width) of
; the character in r25.
__ssd1306_font_get_data_ptr:
\tldi    zl, low(FLASH_ADDR(__ssd1306_font_data)+__ssd1306_font_ascii_order_glyph_map_offset)
\tldi    zh, high(FLASH_ADDR(__ssd1306_font_data)+__ssd1306_font_ascii_order_glyph_map_offset)
\t
\t; first of all, see if the requested character has a glyph
\tsubi   r16, __ssd1306_font_first_glyph
\tcpi    r16, __ssd1306_font_last_glyph - __ssd1306_font_first_glyph + 1
\tbrlo   __ssd1306_font_get_data_ptr_exists
\tsubi   r16, -__ssd1306_font_first_glyph
\tret
__ssd1306_font_get_data_ptr_exists:
\tsave_registers(r19, r20, r21, r22, r23, xl, xh)

\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\t; step 1: determine the index into the character map
\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\tldi    r24, __ssd1306_font_index_bits
\tldi    r25, __ssd1306_font_table_bits
\tin     r19, SREG
\tcli                ; because we are going to clobber r0:r1
\tmul    r16, r24
\tmovw   r20, rC0
\tmul    r16, r25
\tmovw   r22, rC0
\tclr    rC0
\tclr    rC1
\tout    SREG, r19   ; restore IE flag
\tinc    rC1
\tadd    r20, r22
\tadc    r21, r23

\t; r20:r21 now contains the bit index into the table,
\t; convert that into a byte index + bit offset
\tmov    xh, r20
\tandi   xh, 0x07    ; xh is the bit offset
\tasr    r21
\tror    r20
\tasr    r21
\tror    r20
\tasr    r21
\tror    r20
\tmov    xl, r20     ; xl is the byte index
\tadd    zl, xl
\tadc    zh, rC0
\t; z now contains the index to the first byte

\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\t; step 2: determine the table and index into the table
\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\tlpm    r20, z+
";

const ROUTINE_EXTRACT: &str = "
\tmov    r24, xh    ; bit offset
\tsubi   r24, -(__ssd1306_font_table_bits+__ssd1306_font_index_bits)
\tldi    r23, 8
\tsub    r23, r24
\t; r23 = amount to shift right to align table bits
\tandi   r23, 0x07

\tmov    r24, r21
\tmov    r25, r22
__ssd1306_font_extract_table_bits:
\tcp     r23, rC0
\tbreq   __ssd1306_font_extract_table_bits_done
\tasr    r25
\tror    r24
\tdec    r23
\trjmp   __ssd1306_font_extract_table_bits
__ssd1306_font_extract_table_bits_done:
\tmov    xl, r24     ; xl is the table index
\tandi   xl, __ssd1306_font_table_mask

\tmov    r24, xh     ; bit offset
\tsubi   r24, -(__ssd1306_font_index_bits)
\tldi    r23, 8
\tsub    r23, r24
\t; r23 = amount to shift right to align index bits
\tandi   r23, 0x07

\tmov    r24, r20
\tmov    r25, r21
__ssd1306_font_extract_index_bits:
\tcp     r23, rC0
\tbreq   __ssd1306_font_extract_index_bits_done
\tasr    r25
\tror    r24
\tdec    r23
\trjmp   __ssd1306_font_extract_index_bits
__ssd1306_font_extract_index_bits_done:
\tmov    xh, r24     ; xh is the index in the table
\tandi   xh, __ssd1306_font_index_mask

\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\t; step 3: convert table and index into pointer
\t;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;;
\tldi    zl, low(FLASH_ADDR(__ssd1306_font_data))
\tldi    zh, high(FLASH_ADDR(__ssd1306_font_data))
\tadd    zl, xl
\tadc    zh, rC0
\tadd    zl, xl
\tadc    zh, rC0     ; add 2*table_index
\tlpm    r24, z+
\tlpm    r25, z+     ; load table pointer
\tmovw   zl, r24     ; z = start of table

\t; locate correct index (depends on the width of the glyph)
\tin     r19, SREG
\tcli                ; because we are going to clobber r0:r1
\tmul    xh, xl      ; nth-table entry to byte offset
\tmovw   r24, rC0    ; r24:r25 is byte offset in table
\tclr    rC0
\tclr    rC1
\tout    SREG, r19   ; restore IE flag
\tinc    rC1

\tadd    zl, r24
\tadc    zh, r25     ; z points to first byte of glyph
\tmov    r25, xl     ; r25 is the length of the glyph
";

const ROUTINE_TAIL: &str = "\
\trestore_registers(r19, r20, r21, r22, r23, xl, xh)
\tret
";

#[cfg(test)]
mod tests {
    use super::emit;
    use crate::blob::{FontParams, assemble};
    use crate::glyph::{CELL, Glyph};
    use crate::pack::pack_index;
    use crate::tables::plan_layout;

    fn emitted(glyphs: &[Glyph]) -> String {
        let layout = plan_layout(glyphs).unwrap();
        let blob = assemble(&layout, pack_index(&layout));
        let params = FontParams::from_layout(&layout);
        let mut out = Vec::new();
        emit(&mut out, &layout, &blob, &params).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn small_font() -> Vec<Glyph> {
        (0u8..=37)
            .map(|code| {
                let mut rows = [0u8; CELL];
                match code {
                    33 => rows[0] = 0b1,
                    37 => rows[0] = 0b11,
                    _ => {}
                }
                Glyph::from_rows(code, rows)
            })
            .collect()
    }

    #[test]
    fn defines_carry_the_decode_constants() {
        let asm = emitted(&small_font());
        assert!(asm.contains("#define __ssd1306_font_first_glyph (0x20)"));
        assert!(asm.contains("#define __ssd1306_font_last_glyph (0x25)"));
        assert!(asm.contains("#define __ssd1306_font_table_bits (0x02)"));
        assert!(asm.contains("#define __ssd1306_font_table_mask (0x03)"));
        assert!(asm.contains("#define __ssd1306_font_index_bits (0x01)"));
        assert!(asm.contains("#define __ssd1306_font_index_mask (0x01)"));
        assert!(asm.contains("#define __ssd1306_font_ascii_order_glyph_map_offset (0x0006)"));
    }

    #[test]
    fn directory_entries_use_flash_address_expressions() {
        let asm = emitted(&small_font());
        assert!(
            asm.contains("low(FLASH_ADDR(__ssd1306_font_data) + 0x0009)"),
            "width-1 table pointer missing:\n{asm}"
        );
        assert!(asm.contains("high(FLASH_ADDR(__ssd1306_font_data) + 0x000b)"));
        // The width-0 placeholder emits a null pointer.
        assert!(asm.contains(".db 0x00, 0x00, low("));
    }

    #[test]
    fn blob_label_and_routine_are_present() {
        let asm = emitted(&small_font());
        assert!(asm.contains("__ssd1306_font_data:"));
        assert!(asm.contains("__ssd1306_font_get_data_ptr:"));
        assert!(asm.contains("save_registers(r19, r20, r21, r22, r23, xl, xh)"));
        // pair is 3 bits: second fetch and the extraction block are emitted,
        // the third fetch is not.
        assert!(asm.contains("lpm    r21, z+"));
        assert!(!asm.contains("lpm    r22, z+"));
        assert!(asm.contains("__ssd1306_font_extract_table_bits:"));
    }

    #[test]
    fn storage_report_totals_match_the_blob() {
        let asm = emitted(&small_font());
        assert!(asm.contains("; Number of glyphs: 2"));
        assert!(asm.contains("; Glyph-width to table mapping: 6 bytes"));
        assert!(asm.contains("; Character to glyph table/index mapping: 3 bytes"));
        assert!(asm.contains("; Glyph data: 5 bytes"), "4 data bytes + pad:\n{asm}");
        assert!(asm.contains("; Total storage used: 14 bytes"));
    }
}
