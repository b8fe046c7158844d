//! Turns an occupancy region into an ordered sequence of stitch/jump moves.
//!
//! Rows are traversed top to bottom in a boustrophedon: even rows run left
//! to right, odd rows right to left, so consecutive rows meet at the same
//! edge and travel between them is minimal. Every occupied cell is filled
//! with a fixed zigzag motif whose net displacement is exactly one cell
//! width in the direction of travel, which keeps the needle position
//! predictable for the next jump computation.

use crate::{
    consts::{CELL_UNITS, ZIGZAG_STEP},
    image::Region,
};
use itertools::Either;

/// One abstract needle operation, displacements in device units relative
/// to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// The needle penetrates the fabric at the end of the displacement.
    Stitch { dx: i32, dy: i32 },
    /// The head travels without penetrating.
    Jump { dx: i32, dy: i32 },
    /// Stop and switch to the next thread color.
    ColorChange,
    /// End of the program.
    End,
}

/// Absolute needle position in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Cell fill motif for left-to-right rows: a lock stitch, then three
/// down-diagonals each chased by a vertical return. Sums to
/// `(CELL_UNITS, 0)`, ending at the entry point of the next cell to the
/// right. Right-to-left rows mirror `dx`.
pub const MOTIF: [(i32, i32); 7] = [
    (0, 0),
    (ZIGZAG_STEP, CELL_UNITS),
    (0, -CELL_UNITS),
    (ZIGZAG_STEP, CELL_UNITS),
    (0, -CELL_UNITS),
    (ZIGZAG_STEP, CELL_UNITS),
    (0, -CELL_UNITS),
];

/// Net motif displacement for a row of the given parity.
pub fn motif_net(odd_row: bool) -> (i32, i32) {
    let (dx, dy) = MOTIF
        .iter()
        .fold((0, 0), |(x, y), (dx, dy)| (x + dx, y + dy));
    if odd_row {
        (-dx, dy)
    } else {
        (dx, dy)
    }
}

/// Where the motif for cell `(col, row)` starts: the cell's top-left
/// corner on even rows, top-right on odd rows, so mirrored motifs of
/// adjacent rows interlock at the shared cell edges.
fn cell_entry(col: u32, row: u32) -> Point {
    let odd = row % 2 == 1;
    let col = if odd { col as i32 + 1 } else { col as i32 };
    Point::new(col * CELL_UNITS, row as i32 * CELL_UNITS)
}

/// Plans the fill for one region, starting with the needle at `pen`.
///
/// Returns the moves and the needle position after the last of them.
/// Deterministic and pure; an empty region yields no moves at all.
pub fn plan_region(region: &Region, pen: Point) -> (Vec<Move>, Point) {
    let mut moves = Vec::new();
    let mut pen = pen;

    for row in 0..region.height() {
        let odd = row % 2 == 1;
        let cols = if odd {
            Either::Left((0..region.width()).rev())
        } else {
            Either::Right(0..region.width())
        };

        for col in cols {
            if !region.is_set(col, row) {
                continue;
            }

            let entry = cell_entry(col, row);
            if entry != pen {
                moves.push(Move::Jump {
                    dx: entry.x - pen.x,
                    dy: entry.y - pen.y,
                });
                pen = entry;
            }

            for (dx, dy) in MOTIF {
                let dx = if odd { -dx } else { dx };
                moves.push(Move::Stitch { dx, dy });
                pen.x += dx;
                pen.y += dy;
            }
        }
    }

    (moves, pen)
}
