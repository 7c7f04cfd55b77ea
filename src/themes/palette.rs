// Palette inspection hook
// Fills color_hash / is_dark_theme for uploaded themes. No derivation ships by default.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    pub color_hash: String,
    pub is_dark_theme: bool,
}

pub trait PaletteInspector: Send + Sync {
    fn inspect(&self, css: &[u8]) -> Palette;
}

/// Leaves the palette unset: empty color hash, light theme.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPalette;

impl PaletteInspector for NoPalette {
    fn inspect(&self, _css: &[u8]) -> Palette {
        Palette::default()
    }
}
