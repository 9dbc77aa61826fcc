use std::cmp::Ordering;
use std::fmt;

/// Cell edge length in pixels. Glyph height is fixed at 8 rows; only the
/// width varies via the bounding box.
pub const CELL: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

/// Tight crop of a glyph's filled pixels within its 8x8 cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub origin: Position,
    pub width: usize,
    pub height: usize,
}

impl Bounds {
    #[inline(always)]
    pub fn left(&self) -> usize {
        self.origin.x
    }

    #[inline(always)]
    pub fn top(&self) -> usize {
        self.origin.y
    }

    #[inline(always)]
    pub fn right(&self) -> usize {
        self.origin.x + self.width - 1
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {} | {}x{}]",
            self.left(),
            self.top(),
            self.width,
            self.height
        )
    }
}

/// One extracted glyph: character code, 8x8 bit matrix and its tight
/// bounding box. Immutable once built. Equality and ordering are by
/// character code only; two codes with identical bitmaps stay distinct
/// (downstream index math assumes one table slot per code).
#[derive(Debug, Clone)]
pub struct Glyph {
    code: u8,
    rows: [u8; CELL],
    bounds: Bounds,
    empty: bool,
}

impl Glyph {
    /// Builds a glyph from row bytes, bit `x` of `rows[y]` set iff the pixel
    /// at column `x`, row `y` is filled. An all-zero matrix yields an empty
    /// glyph whose degenerate box collapses to the full cell.
    pub fn from_rows(code: u8, rows: [u8; CELL]) -> Self {
        let (mut l, mut r, mut t, mut b) = (CELL - 1, 0, CELL - 1, 0);
        let mut empty = true;
        for (y, &row) in rows.iter().enumerate() {
            for x in 0..CELL {
                if row & (1 << x) != 0 {
                    l = l.min(x);
                    r = r.max(x);
                    t = t.min(y);
                    b = b.max(y);
                    empty = false;
                }
            }
        }
        if empty {
            (l, r) = (r, l);
            (t, b) = (b, t);
        }
        Self {
            code,
            rows,
            bounds: Bounds {
                origin: Position { x: l, y: t },
                width: r - l + 1,
                height: b - t + 1,
            },
            empty,
        }
    }

    #[inline(always)]
    pub fn code(&self) -> u8 {
        self.code
    }

    #[inline(always)]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    #[inline(always)]
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.rows[y] & (1 << x) != 0
    }

    /// Column byte for cell column `x`: bit `n` set iff pixel row `n` is
    /// filled. This is the unit the blob stores.
    pub fn column(&self, x: usize) -> u8 {
        let mut out = 0u8;
        for (y, &row) in self.rows.iter().enumerate() {
            if row & (1 << x) != 0 {
                out |= 1 << y;
            }
        }
        out
    }

    /// Column bytes across the bounding box, left to right.
    pub fn box_columns(&self) -> Vec<u8> {
        (self.bounds.left()..=self.bounds.right())
            .map(|x| self.column(x))
            .collect()
    }

    /// Printable form for diagnostics; control and non-ASCII codes show as '.'.
    pub fn printable(&self) -> char {
        if self.code > 0x20 && self.code < 0x7f {
            self.code as char
        } else {
            '.'
        }
    }
}

impl PartialEq for Glyph {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Glyph {}

impl PartialOrd for Glyph {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Glyph {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(&other.code)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bounds, CELL, Glyph, Position};

    fn rows_from(art: [&str; CELL]) -> [u8; CELL] {
        let mut rows = [0u8; CELL];
        for (y, line) in art.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                if ch == '#' {
                    rows[y] |= 1 << x;
                }
            }
        }
        rows
    }

    #[test]
    fn bounding_box_is_tight() {
        let g = Glyph::from_rows(
            b'I',
            rows_from([
                "........", "..###...", "...#....", "...#....", "...#....", "..###...", "........",
                "........",
            ]),
        );
        assert!(!g.is_empty());
        assert_eq!(
            g.bounds(),
            Bounds {
                origin: Position { x: 2, y: 1 },
                width: 3,
                height: 5
            },
            "box should crop to the filled pixels"
        );
    }

    #[test]
    fn empty_glyph_collapses_to_full_cell_box() {
        let g = Glyph::from_rows(0, [0; CELL]);
        assert!(g.is_empty());
        // Degenerate sentinel swaps into the full-cell box, matching the
        // reference extractor. Empty glyphs never join a width group, so the
        // box is inert.
        assert_eq!(
            g.bounds(),
            Bounds {
                origin: Position { x: 0, y: 0 },
                width: CELL,
                height: CELL
            }
        );
    }

    #[test]
    fn column_bits_follow_rows() {
        // Single pixel at (x=3, y=6).
        let mut rows = [0u8; CELL];
        rows[6] = 1 << 3;
        let g = Glyph::from_rows(b'.', rows);
        assert_eq!(g.column(3), 1 << 6);
        assert_eq!(g.column(2), 0);
        assert_eq!(g.bounds().width, 1);
        assert_eq!(g.box_columns(), vec![1 << 6]);
    }

    #[test]
    fn box_columns_round_trip_the_bit_matrix() {
        let rows = rows_from([
            "........", ".#...#..", ".##..#..", ".#.#.#..", ".#..##..", ".#...#..", "........",
            "........",
        ]);
        let g = Glyph::from_rows(b'N', rows);
        let cols = g.box_columns();
        assert_eq!(cols.len(), g.bounds().width);
        for (i, col) in cols.iter().enumerate() {
            let x = g.bounds().left() + i;
            for y in 0..CELL {
                assert_eq!(
                    col & (1 << y) != 0,
                    g.pixel(x, y),
                    "column byte must reproduce pixel ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn ordering_ignores_bitmap_content() {
        let a = Glyph::from_rows(b'A', rows_from([".#......"; CELL]));
        let b = Glyph::from_rows(b'A', [0; CELL]);
        assert_eq!(a, b, "glyph identity is the character code alone");
    }
}
