//! Converter from palette-quantized pixel images to the Barudan DSB
//! embroidery stitch format.
//!
//! A DSB file is a 512-byte ASCII statistics header followed by a stream of
//! 3-byte commands. Each command moves the machine head by a signed
//! displacement relative to the current needle position, either while
//! stitching (thread goes down) or jumping (head travels, no penetration).
//!
//! # Header
//!
//! - 20-byte label: `LA:~temp.qe DSC.QEP\n`
//! - ASCII lines for the stitch count (`ST:`), color-change count (`CO:`),
//!   the four bounding-box extents (`+X:`/`-X:`/`+Y:`/`-Y:`, as non-negative
//!   magnitudes), and the final needle position (`AX:+`/`AY:+`)
//! - the rest of the 512 bytes padded with ASCII spaces
//!
//! # Command stream
//!
//! A command is `(op, |dy|, |dx|)`, with the Y magnitude first. Displacement signs
//! live in the op byte (bit 5 negates X, bit 6 negates Y), so each axis
//! magnitude is limited to [`consts::MAX_DELTA`] units per command; longer
//! jumps are split into chains of capped commands. The stream ends with
//! [`consts::DSB_OP_END`]. See [consts] for the full op vocabulary.
//!
//! # Pipeline
//!
//! [`image::segment`] splits a [`QuantizedImage`](image::QuantizedImage)
//! into one occupancy [`Region`](image::Region) per palette color,
//! [`plan::plan_region`] turns a region into jump/stitch [`Move`](plan::Move)s
//! that fill every cell with a fixed zigzag motif, [`encode::encode_move`]
//! lowers moves to capped [`Command`](encode::Command)s, and
//! [`write::DsbWriter`] streams them to a [`ByteSink`](write::ByteSink)
//! while tracking the statistics the header needs. [`convert::convert_to_vec`]
//! runs the whole chain.

pub mod convert;
pub mod encode;
pub mod image;
pub mod plan;
pub mod read;
pub mod write;

pub use convert::{convert_to_vec, ConvertError, ConvertOptions};
pub use encode::Command;
pub use image::{QuantizedImage, Region, Rgb};
pub use plan::Move;
pub use write::{DsbWriter, HeaderStats};

pub mod consts {
    /// Stitch with non-negative X and Y displacement.
    ///
    /// ```plain
    /// .- DSB_OP_STITCH -------------------------------.
    /// |  Byte[0]                | Byte[1] |  Byte[2]  |
    /// |  7  6  5  4  3  2  1  0 |  |dy|   |   |dx|    |
    /// |-------------------------+---------+-----------|
    /// |  1  0  0  0  0  0  0  0 |  0..255 |  0..255   |
    /// `-----------------------------------------------`
    /// ```
    ///
    /// - bit 7 is set on every op
    /// - bit 6 clear: Y displacement is `+|dy|`
    /// - bit 5 clear: X displacement is `+|dx|`
    /// - bit 0 clear: the needle penetrates (a stitch, not a jump)
    pub const DSB_OP_STITCH: u8 = 0x80;

    /// Stitch with negative X displacement (bit 5 set).
    pub const DSB_OP_STITCH_NEG_X: u8 = 0xA0;

    /// Stitch with negative Y displacement (bit 6 set).
    pub const DSB_OP_STITCH_NEG_Y: u8 = 0xC0;

    /// Stitch with both displacements negative (bits 5 and 6 set).
    pub const DSB_OP_STITCH_NEG_BOTH: u8 = 0xE0;

    /// Jump (bit 0 set): the head moves without penetrating the fabric.
    ///
    /// ```plain
    /// .- DSB_OP_JUMP ---------------------------------.
    /// |  Byte[0]                | Byte[1] |  Byte[2]  |
    /// |  7  6  5  4  3  2  1  0 |  |dy|   |   |dx|    |
    /// |-------------------------+---------+-----------|
    /// |  1  0  0  0  0  0  0  1 |  0..255 |  0..255   |
    /// `-----------------------------------------------`
    /// ```
    ///
    /// Sign bits work exactly as for stitches. Jumps longer than
    /// [`MAX_DELTA`] on an axis are emitted as a chain of capped jumps.
    pub const DSB_OP_JUMP: u8 = 0x81;

    /// Jump with negative X displacement.
    pub const DSB_OP_JUMP_NEG_X: u8 = 0xA1;

    /// Jump with negative Y displacement.
    pub const DSB_OP_JUMP_NEG_Y: u8 = 0xC1;

    /// Jump with both displacements negative.
    pub const DSB_OP_JUMP_NEG_BOTH: u8 = 0xE1;

    /// Stop and switch to the next thread color (bit 3). Zero displacement.
    pub const DSB_OP_COLOR_CHANGE: u8 = 0x88;

    /// Marks the end of the stream. Zero displacement.
    ///
    /// ```plain
    /// .- DSB_OP_END ------------.
    /// |         Byte[0]         |
    /// |  7  6  5  4  3  2  1  0 |
    /// |-------------------------|
    /// |  1  1  1  1  1  0  0  0 |
    /// `-------------------------`
    /// ```
    pub const DSB_OP_END: u8 = 0xF8;

    /// Per-command, per-axis displacement magnitude cap in device units.
    ///
    /// Magnitudes are unsigned bytes, so 255 is the natural limit; moves
    /// beyond it must be chained.
    pub const MAX_DELTA: u32 = 255;

    /// Device units covered by one pixel cell.
    pub const CELL_UNITS: i32 = 9;

    /// Horizontal advance per diagonal of the cell fill motif.
    pub const ZIGZAG_STEP: i32 = 3;

    /// Total header size in bytes.
    pub const HEADER_LEN: usize = 512;

    /// Fixed 20-byte header label.
    pub const HEADER_LABEL: &[u8; 20] = b"LA:~temp.qe DSC.QEP\n";
}
