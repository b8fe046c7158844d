//! Quantized input images and per-color occupancy regions.

use snafu::{ensure, Snafu};

/// One palette entry, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Snafu)]
pub enum ImageError {
    #[snafu(display(
        "image dimensions don't match the pixel data: {width} * {height} == {} pixels, \
         but {pixel_count} were given",
        width * height
    ))]
    InvalidDimensions {
        width: u32,
        height: u32,
        pixel_count: usize,
    },
    #[snafu(display(
        "pixel at ({x}, {y}) references palette index {index}, \
         but the palette has {palette_len} entries"
    ))]
    IndexOutOfRange {
        x: u32,
        y: u32,
        index: u8,
        palette_len: usize,
    },
    #[snafu(display("palette has {palette_len} entries, but indices only address 256"))]
    PaletteTooLarge { palette_len: usize },
}

/// A pixel image whose colors have already been reduced to a small ordered
/// palette. `None` marks background pixels that belong to no region.
///
/// The constructor validates the data; everything downstream reads it
/// without further checks.
#[derive(Debug, Clone)]
pub struct QuantizedImage {
    width: u32,
    height: u32,
    indices: Vec<Option<u8>>,
    palette: Vec<Rgb>,
}

impl QuantizedImage {
    pub fn new(
        width: u32,
        height: u32,
        indices: Vec<Option<u8>>,
        palette: Vec<Rgb>,
    ) -> Result<Self, ImageError> {
        ensure!(
            palette.len() <= 256,
            PaletteTooLargeSnafu {
                palette_len: palette.len()
            }
        );

        let pixel_count = indices.len();
        ensure!(
            width as usize * height as usize == pixel_count,
            InvalidDimensionsSnafu {
                width,
                height,
                pixel_count
            }
        );

        for (i, index) in indices.iter().enumerate() {
            if let Some(index) = *index {
                ensure!(
                    usize::from(index) < palette.len(),
                    IndexOutOfRangeSnafu {
                        x: i as u32 % width,
                        y: i as u32 / width,
                        index,
                        palette_len: palette.len()
                    }
                );
            }
        }

        Ok(Self {
            width,
            height,
            indices,
            palette,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    pub fn index_at(&self, x: u32, y: u32) -> Option<u8> {
        self.indices[y as usize * self.width as usize + x as usize]
    }
}

/// Occupancy grid for one palette color: `true` where that color is
/// stitched, `false` for holes filled by other colors or background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Region {
    fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    fn set(&mut self, x: u32, y: u32) {
        self.cells[y as usize * self.width as usize + x as usize] = true;
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.contains(&true)
    }
}

/// Splits an image into one region per palette entry, index-aligned.
///
/// A color with no pixels yields an all-false region; planning treats it
/// as a no-op. Every non-background pixel lands in exactly one region.
pub fn segment(image: &QuantizedImage) -> Vec<Region> {
    let mut regions: Vec<Region> = (0..image.palette().len())
        .map(|_| Region::empty(image.width(), image.height()))
        .collect();

    for y in 0..image.height() {
        for x in 0..image.width() {
            if let Some(index) = image.index_at(x, y) {
                regions[usize::from(index)].set(x, y);
            }
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_color_diagonal() -> QuantizedImage {
        // 0 1
        // 1 0
        QuantizedImage::new(
            2,
            2,
            vec![Some(0), Some(1), Some(1), Some(0)],
            vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)],
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let err = QuantizedImage::new(3, 2, vec![None; 5], vec![]).unwrap_err();
        assert!(matches!(err, ImageError::InvalidDimensions { .. }));
    }

    #[test]
    fn rejects_out_of_range_palette_index() {
        let err = QuantizedImage::new(1, 1, vec![Some(1)], vec![Rgb::new(0, 0, 0)]).unwrap_err();
        assert!(matches!(
            err,
            ImageError::IndexOutOfRange { x: 0, y: 0, index: 1, .. }
        ));
    }

    #[test]
    fn regions_partition_the_image() {
        let image = two_color_diagonal();
        let regions = segment(&image);
        assert_eq!(regions.len(), 2);

        for y in 0..2 {
            for x in 0..2 {
                let owners = regions.iter().filter(|r| r.is_set(x, y)).count();
                assert_eq!(owners, 1, "cell ({x}, {y}) must be owned exactly once");
            }
        }
        assert!(regions[0].is_set(0, 0) && regions[0].is_set(1, 1));
        assert!(regions[1].is_set(1, 0) && regions[1].is_set(0, 1));
    }

    #[test]
    fn background_pixels_belong_to_no_region() {
        let image =
            QuantizedImage::new(2, 1, vec![Some(0), None], vec![Rgb::new(10, 20, 30)]).unwrap();
        let regions = segment(&image);
        assert!(regions[0].is_set(0, 0));
        assert!(!regions[0].is_set(1, 0));
        assert_eq!(regions[0].occupied_count(), 1);
    }

    #[test]
    fn segmentation_is_idempotent() {
        let image = two_color_diagonal();
        assert_eq!(segment(&image), segment(&image));
    }

    #[test]
    fn unused_palette_entry_yields_empty_region() {
        let image = QuantizedImage::new(
            1,
            1,
            vec![Some(0)],
            vec![Rgb::new(0, 0, 0), Rgb::new(1, 2, 3)],
        )
        .unwrap();
        let regions = segment(&image);
        assert!(!regions[0].is_empty());
        assert!(regions[1].is_empty());
    }
}
