//! Lowers abstract moves to DSB command triples.
//!
//! Displacement signs are carried in the op byte (a 2x2 sign quadrant per
//! operation kind), magnitudes in the two payload bytes, Y first. A jump
//! longer than [`MAX_DELTA`] units on an axis becomes a chain of capped
//! jumps with unchanged direction; stitches are short by construction, so
//! an over-cap stitch is an error in the planner, not something to split.

use crate::{
    consts::{
        DSB_OP_COLOR_CHANGE, DSB_OP_END, DSB_OP_JUMP, DSB_OP_STITCH, DSB_OP_STITCH_NEG_BOTH,
        DSB_OP_STITCH_NEG_X, DSB_OP_STITCH_NEG_Y, MAX_DELTA,
    },
    plan::Move,
};
use snafu::{ensure, Snafu};

const NEG_X_BIT: u8 = 0x20;
const NEG_Y_BIT: u8 = 0x40;
const JUMP_BIT: u8 = 0x01;

/// One encoded 3-byte command: `(op, |dy|, |dx|)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub op: u8,
    pub dy: u8,
    pub dx: u8,
}

impl Command {
    pub const COLOR_CHANGE: Self = Self {
        op: DSB_OP_COLOR_CHANGE,
        dy: 0,
        dx: 0,
    };

    pub const END: Self = Self {
        op: DSB_OP_END,
        dy: 0,
        dx: 0,
    };

    pub fn is_stitch(&self) -> bool {
        matches!(
            self.op,
            DSB_OP_STITCH | DSB_OP_STITCH_NEG_X | DSB_OP_STITCH_NEG_Y | DSB_OP_STITCH_NEG_BOTH
        )
    }

    pub fn is_jump(&self) -> bool {
        !self.is_end() && !self.is_color_change() && self.op & JUMP_BIT != 0
    }

    pub fn is_color_change(&self) -> bool {
        self.op == DSB_OP_COLOR_CHANGE
    }

    pub fn is_end(&self) -> bool {
        self.op == DSB_OP_END
    }

    /// Reconstructs the signed displacement from the sign-quadrant bits of
    /// the op byte. Color changes and the end marker move nothing.
    pub fn signed_delta(&self) -> (i32, i32) {
        if self.is_color_change() || self.is_end() {
            return (0, 0);
        }

        let dx = if self.op & NEG_X_BIT != 0 {
            -i32::from(self.dx)
        } else {
            i32::from(self.dx)
        };
        let dy = if self.op & NEG_Y_BIT != 0 {
            -i32::from(self.dy)
        } else {
            i32::from(self.dy)
        };
        (dx, dy)
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.op, self.dy, self.dx]
    }

    pub fn from_bytes([op, dy, dx]: [u8; 3]) -> Self {
        Self { op, dy, dx }
    }
}

#[derive(Debug, Snafu)]
pub enum EncodeError {
    #[snafu(display(
        "stitch displacement ({dx}, {dy}) exceeds {MAX_DELTA} units per axis; \
         stitches must stay within a single cell motif"
    ))]
    StitchTooLong { dx: i32, dy: i32 },
}

fn opcode(jump: bool, dx: i32, dy: i32) -> u8 {
    let mut op = if jump { DSB_OP_JUMP } else { DSB_OP_STITCH };
    if dx < 0 {
        op |= NEG_X_BIT;
    }
    if dy < 0 {
        op |= NEG_Y_BIT;
    }
    op
}

/// Encodes one move as one or more commands.
///
/// Stitches and in-cap jumps map to exactly one command. An over-cap jump
/// chains `ceil(max(|dx|, |dy|) / MAX_DELTA)` commands whose magnitudes sum
/// to the full displacement; a zero-displacement jump encodes to nothing.
pub fn encode_move(mv: Move) -> Result<Vec<Command>, EncodeError> {
    match mv {
        Move::Stitch { dx, dy } => {
            ensure!(
                dx.unsigned_abs() <= MAX_DELTA && dy.unsigned_abs() <= MAX_DELTA,
                StitchTooLongSnafu { dx, dy }
            );
            Ok(vec![Command {
                op: opcode(false, dx, dy),
                dy: dy.unsigned_abs() as u8,
                dx: dx.unsigned_abs() as u8,
            }])
        }
        Move::Jump { dx, dy } => Ok(encode_jump(dx, dy)),
        Move::ColorChange => Ok(vec![Command::COLOR_CHANGE]),
        Move::End => Ok(vec![Command::END]),
    }
}

fn encode_jump(dx: i32, dy: i32) -> Vec<Command> {
    let op = opcode(true, dx, dy);
    let mut rest_x = dx.unsigned_abs();
    let mut rest_y = dy.unsigned_abs();

    let mut out = Vec::new();
    while rest_x > 0 || rest_y > 0 {
        let step_x = rest_x.min(MAX_DELTA);
        let step_y = rest_y.min(MAX_DELTA);
        out.push(Command {
            op,
            dy: step_y as u8,
            dx: step_x as u8,
        });
        rest_x -= step_x;
        rest_y -= step_y;
    }
    out
}
