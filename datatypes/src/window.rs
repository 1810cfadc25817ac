use serde::{Deserialize, Serialize};

/// An integer window into a pixel grid: `(col_off, row_off, width,
/// height)`, spec §3. Signed so that windows derived from reprojected
/// bounds (which may overhang a source raster) can be represented
/// before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub col_off: i64,
    pub row_off: i64,
    pub width: i64,
    pub height: i64,
}

impl Window {
    pub fn new(col_off: i64, row_off: i64, width: i64, height: i64) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Splits this window into a row-major grid of sub-windows with
    /// edges at most `edge` pixels, used by the export writer to
    /// stream a large grid in bounded memory (spec §4.6 step 3). The
    /// last row/column of sub-windows may be smaller than `edge`.
    pub fn tile(&self, edge: i64) -> Vec<Window> {
        let mut out = Vec::new();
        let mut row = 0;
        while row < self.height {
            let h = edge.min(self.height - row);
            let mut col = 0;
            while col < self.width {
                let w = edge.min(self.width - col);
                out.push(Window::new(self.col_off + col, self.row_off + row, w, h));
                col += edge;
            }
            row += edge;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiling_covers_the_whole_window_row_major() {
        let window = Window::new(0, 0, 10, 10);
        let tiles = window.tile(4);
        let total: i64 = tiles.iter().map(|t| t.width * t.height).sum();
        assert_eq!(total, 100);
        // row-major: the second tile is to the right of the first, not below it
        assert_eq!(tiles[0], Window::new(0, 0, 4, 4));
        assert_eq!(tiles[1], Window::new(4, 0, 4, 4));
        assert_eq!(tiles[2], Window::new(8, 0, 2, 4));
    }

    #[test]
    fn tiling_exact_multiple() {
        let window = Window::new(0, 0, 8, 8);
        let tiles = window.tile(4);
        assert_eq!(tiles.len(), 4);
    }
}
