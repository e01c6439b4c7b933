use pc_core::charset::CharacterTable;
use pc_core::config::ColorMode;
use pc_core::frame::{BrailleCell, Glyph, Grid, Rgb, Sample, invert_rgb};

/// Braille base codepoint (U+2800).
const BRAILLE_BASE: u32 = 0x2800;

/// Bit de chaque point, indexé `[ligne][colonne]`.
///
/// Braille dot numbering:
/// ```text
///  1 4
///  2 5
///  3 6
///  7 8
/// ```
const DOT_BITS: [[u32; 2]; 4] = [[0x01, 0x08], [0x02, 0x10], [0x04, 0x20], [0x40, 0x80]];

/// Couleur portée par le glyphe : grise, sauf en mode coloré.
fn display_rgb(sample: &Sample, mode: ColorMode) -> Rgb {
    match mode {
        ColorMode::Colored => sample.color,
        ColorMode::Plain | ColorMode::Grayscale => sample.gray,
    }
}

/// Mode rampe / table personnalisée.
///
/// In negative mode the bucket is mirrored (`len - 1 - index`) and the
/// glyph color is inverted.
///
/// # Example
/// ```
/// use pc_ascii::mapper::map_ramp;
/// use pc_core::{CharacterTable, ColorMode, Grid, Sample};
/// let samples = Grid::from_rows(vec![vec![Sample::from_pixel(0, 0, 0)]]).unwrap();
/// let glyphs = map_ramp(samples, &CharacterTable::simple(), true, ColorMode::Plain);
/// assert_eq!(glyphs.get(0, 0).ch, '@');
/// ```
#[must_use]
pub fn map_ramp(
    samples: Grid<Sample>,
    table: &CharacterTable,
    negative: bool,
    mode: ColorMode,
) -> Grid<Glyph> {
    let last = table.len() - 1;
    samples.map(|s| {
        let idx = table.bucket(&s);
        let rgb = display_rgb(&s, mode);
        if negative {
            Glyph::plain(table.glyph(last - idx), invert_rgb(rgb))
        } else {
            Glyph::plain(table.glyph(idx), rgb)
        }
    })
}

/// Encode une supercellule : chaque point est comparé au seuil.
///
/// Lit si `level >= threshold`, ou `level <= threshold` en mode négatif.
///
/// # Example
/// ```
/// use pc_ascii::mapper::encode_braille;
/// use pc_core::frame::{BrailleCell, Sample};
/// let dark = Sample::from_pixel(0, 0, 0);
/// let cell = BrailleCell { representative: dark, dots: [dark; 8] };
/// assert_eq!(encode_braille(&cell, 128, false), '\u{2800}');
/// assert_eq!(encode_braille(&cell, 128, true), '\u{28FF}');
/// ```
#[must_use]
pub fn encode_braille(cell: &BrailleCell, threshold: u8, negative: bool) -> char {
    let mut code = 0u32;
    for (i, dot) in cell.dots.iter().enumerate() {
        let level = dot.level();
        let lit = if negative {
            level <= threshold
        } else {
            level >= threshold
        };
        if lit {
            code |= DOT_BITS[i / 2][i % 2];
        }
    }
    char::from_u32(BRAILLE_BASE + code).unwrap_or(' ')
}

/// Mode braille : un glyphe par supercellule, couleur du pixel haut-gauche.
#[must_use]
pub fn map_braille(
    cells: Grid<BrailleCell>,
    threshold: u8,
    negative: bool,
    mode: ColorMode,
) -> Grid<Glyph> {
    cells.map(|cell| {
        let ch = encode_braille(&cell, threshold, negative);
        let rgb = display_rgb(&cell.representative, mode);
        Glyph::plain(ch, if negative { invert_rgb(rgb) } else { rgb })
    })
}
