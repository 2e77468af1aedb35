//! Extruded pixel text
//!
//! Glyphs are rasterized with `fontdue` at `RASTER_PX` pixels per em and
//! every pixel whose coverage reaches `COVERAGE_THRESHOLD` becomes a box of
//! depth `DEPTH`. Side faces shared by two filled cells are skipped, the same
//! hidden-face rule a voxel mesher uses. Blocks are centred on their anchor
//! on all three axes.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

use fontdue::{Font, FontSettings};
use glam::Vec3;

use crate::constants::text::*;
use crate::error::{AppError, AppResult};
use crate::render::mesh::{add_box, BoxFaces, Mesh};

const BUNDLED_FONT: &[u8] = include_bytes!("../../resources/fonts/DejaVuSans-Bold.ttf");

static BUNDLED: OnceLock<Result<PixelFont, String>> = OnceLock::new();

/// Filled pixel cells, x to the right and y up from the baseline
pub type CellSet = BTreeSet<(i32, i32)>;

/// A font rasterized to on/off cells at a fixed pixel height
pub struct PixelFont {
    font: Font,
    px: f32,
}

impl fmt::Debug for PixelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelFont")
            .field("name", &self.font.name())
            .field("px", &self.px)
            .finish()
    }
}

impl PixelFont {
    pub fn from_bytes(data: &[u8], px: f32) -> AppResult<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| AppError::Font(e.to_string()))?;
        log::debug!(
            "[PixelFont::from_bytes] Loaded {:?} at {}px",
            font.name(),
            px
        );
        Ok(Self { font, px })
    }

    /// The font shipped with the crate, parsed on first use
    pub fn bundled() -> AppResult<&'static PixelFont> {
        BUNDLED
            .get_or_init(|| {
                PixelFont::from_bytes(BUNDLED_FONT, RASTER_PX).map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| AppError::Font(e.clone()))
    }

    /// Pixels per em
    pub fn px(&self) -> f32 {
        self.px
    }

    /// Lay out `text` on one line and collect its filled cells
    pub fn cells(&self, text: &str) -> CellSet {
        let mut cells = CellSet::new();
        let mut pen = 0.0f32;
        let mut previous = None;

        for c in text.chars() {
            if let Some(prev) = previous {
                pen += self.font.horizontal_kern(prev, c, self.px).unwrap_or(0.0);
            }
            let (metrics, coverage) = self.font.rasterize(c, self.px);
            let left = pen.round() as i32 + metrics.xmin;

            // Bitmap rows run top to bottom
            for (row, line) in coverage.chunks(metrics.width.max(1)).enumerate() {
                let y = metrics.ymin + (metrics.height - 1 - row) as i32;
                for (col, &value) in line.iter().enumerate() {
                    if value >= COVERAGE_THRESHOLD {
                        cells.insert((left + col as i32, y));
                    }
                }
            }

            pen += metrics.advance_width;
            previous = Some(c);
        }

        cells
    }
}

/// Text mesh anchored at a point
#[derive(Debug, Clone)]
pub struct TextBlock {
    pub text: String,
    pub anchor: Vec3,
    /// Em height in world units
    pub size: f32,
    pub depth: f32,
    font: &'static PixelFont,
    mesh: Mesh,
}

impl TextBlock {
    pub fn new(font: &'static PixelFont, text: &str, anchor: Vec3, size: f32, depth: f32) -> Self {
        let mut block = Self {
            text: String::new(),
            anchor,
            size,
            depth,
            font,
            mesh: Mesh::new(),
        };
        block.set_text(text);
        block
    }

    /// Title line above the countdown
    pub fn title(text: &str) -> AppResult<Self> {
        let font = PixelFont::bundled()?;
        Ok(Self::new(font, text, Vec3::from(TITLE_POSITION), TITLE_SIZE, DEPTH))
    }

    /// Countdown line below the title
    pub fn countdown(label: &str) -> AppResult<Self> {
        let font = PixelFont::bundled()?;
        Ok(Self::new(
            font,
            label,
            Vec3::from(COUNTDOWN_POSITION),
            COUNTDOWN_SIZE,
            DEPTH,
        ))
    }

    /// Replace the text; returns whether the mesh was rebuilt
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text == text && !self.mesh.is_empty() {
            return false;
        }
        self.text = text.to_string();
        self.mesh = build_text_mesh(self.font, &self.text, self.size, self.depth);
        center_on(&mut self.mesh, self.anchor);
        true
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}

/// Extrude `text` with its baseline at y = 0, front face at z = depth
pub fn build_text_mesh(font: &PixelFont, text: &str, size: f32, depth: f32) -> Mesh {
    extrude_cells(&font.cells(text), size / font.px(), depth)
}

/// One box per filled cell, skipping faces between neighbours
pub fn extrude_cells(cells: &CellSet, cell: f32, depth: f32) -> Mesh {
    let mut mesh = Mesh::new();

    for &(x, y) in cells {
        let min = Vec3::new(x as f32 * cell, y as f32 * cell, 0.0);
        let max = Vec3::new((x + 1) as f32 * cell, (y + 1) as f32 * cell, depth);

        let faces = BoxFaces {
            left: !cells.contains(&(x - 1, y)),
            right: !cells.contains(&(x + 1, y)),
            top: !cells.contains(&(x, y + 1)),
            bottom: !cells.contains(&(x, y - 1)),
            front: true,
            back: true,
        };
        add_box(&mut mesh, min, max, faces);
    }

    mesh
}

/// Move `mesh` so the centre of its bounds sits on `anchor`
pub fn center_on(mesh: &mut Mesh, anchor: Vec3) {
    if let Some((min, max)) = mesh.bounds() {
        mesh.translate(anchor - (min + max) * 0.5);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> &'static PixelFont {
        PixelFont::bundled().unwrap()
    }

    #[test]
    fn test_case_is_preserved() {
        let font = font();
        assert_ne!(font.cells("a"), font.cells("A"));
        assert_ne!(font.cells("I love Ronja"), font.cells("I LOVE RONJA"));
    }

    #[test]
    fn test_space_advances_without_cells() {
        let font = font();
        assert!(font.cells(" ").is_empty());

        let right_edge = |text: &str| font.cells(text).iter().map(|c| c.0).max().unwrap();
        assert!(right_edge("1 1") > right_edge("11"));
    }

    #[test]
    fn test_cell_row_culls_shared_sides() {
        let cells: CellSet = [(0, 0), (1, 0), (2, 0)].into_iter().collect();
        let mesh = extrude_cells(&cells, 0.1, 0.05);
        // 3 cells * (front + back + top + bottom) + 2 outer sides
        assert_eq!(mesh.vertices.len() / 4, 3 * 4 + 2);
    }

    #[test]
    fn test_isolated_cell_is_a_full_box() {
        let cells: CellSet = [(4, -2)].into_iter().collect();
        let mesh = extrude_cells(&cells, 0.1, 0.05);
        assert_eq!(mesh.vertices.len() / 4, 6);
    }

    #[test]
    fn test_block_is_centred_on_anchor() {
        let anchor = Vec3::new(0.0, -0.5, 0.0);
        let block = TextBlock::new(font(), "12d 3h", anchor, 0.2, 0.05);
        let (min, max) = block.mesh().bounds().unwrap();
        let centre = (min + max) * 0.5;
        assert!((centre - anchor).length() < 1e-5);
        assert!((max.z - min.z - 0.05).abs() < 1e-6);

        let height = max.y - min.y;
        assert!(height > 0.1 && height <= 0.2, "height {}", height);
    }

    #[test]
    fn test_set_text_only_rebuilds_on_change() {
        let mut block = TextBlock::countdown("1d 2h 3m 4s").unwrap();
        assert!(!block.set_text("1d 2h 3m 4s"));
        assert!(block.set_text("1d 2h 3m 3s"));
        assert_eq!(block.text, "1d 2h 3m 3s");
    }

    #[test]
    fn test_title_mesh_is_not_empty() {
        let title = TextBlock::title(TITLE).unwrap();
        assert!(!title.mesh().is_empty());
        assert_eq!(title.mesh().indices.len() % 6, 0);
    }
}
