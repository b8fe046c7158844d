//! Reads DSB files back: header statistics and the command stream.
//!
//! Not a full device-format decoder; it understands exactly the
//! vocabulary this crate emits, enough to verify artifacts and dump
//! statistics.

use crate::{
    consts::{HEADER_LABEL, HEADER_LEN},
    encode::Command,
    write::HeaderStats,
};
use snafu::{ensure, OptionExt, Snafu};

#[derive(Debug, Snafu)]
pub enum ReadError {
    #[snafu(display("file is {len} bytes, shorter than the {HEADER_LEN}-byte header"))]
    TruncatedHeader { len: usize },
    #[snafu(display("header does not start with the DSB label"))]
    BadLabel,
    #[snafu(display("header is not ASCII text"))]
    NotText,
    #[snafu(display("header field `{field}` is missing"))]
    MissingField { field: &'static str },
    #[snafu(display("header field `{field}` is not a number"))]
    InvalidNumber { field: &'static str },
    #[snafu(display("command stream has no end marker"))]
    MissingEndMarker,
}

fn field(text: &str, prefix: &'static str) -> Result<i64, ReadError> {
    let value = text
        .lines()
        .find_map(|line| line.strip_prefix(prefix))
        .context(MissingFieldSnafu { field: prefix })?;
    value
        .trim()
        .parse()
        .ok()
        .context(InvalidNumberSnafu { field: prefix })
}

/// Parses the numeric fields of a 512-byte header back into
/// [`HeaderStats`]. Extent lines carry per-side magnitudes, so `-X:`/`-Y:`
/// values are negated back into the minima.
pub fn parse_header(data: &[u8]) -> Result<HeaderStats, ReadError> {
    ensure!(data.len() >= HEADER_LEN, TruncatedHeaderSnafu { len: data.len() });
    ensure!(data.starts_with(HEADER_LABEL), BadLabelSnafu);

    let text = std::str::from_utf8(&data[HEADER_LABEL.len()..HEADER_LEN])
        .ok()
        .context(NotTextSnafu)?;

    Ok(HeaderStats {
        stitches: field(text, "ST:")? as u64,
        color_changes: field(text, "CO:")? as u64,
        max_x: field(text, "+X:")? as i32,
        min_x: -field(text, "-X:")? as i32,
        max_y: field(text, "+Y:")? as i32,
        min_y: -field(text, "-Y:")? as i32,
        end_x: field(text, "AX:+")? as i32,
        end_y: field(text, "AY:+")? as i32,
    })
}

/// Splits a complete file into its parsed header and the command body,
/// verifying that the body terminates with the end marker.
pub fn split(data: &[u8]) -> Result<(HeaderStats, &[u8]), ReadError> {
    let stats = parse_header(data)?;
    let body = &data[HEADER_LEN..];
    ensure!(
        commands(body).last().map_or(false, |cmd| cmd.is_end()),
        MissingEndMarkerSnafu
    );
    Ok((stats, body))
}

/// Iterates the 3-byte commands of a body, up to and including the end
/// marker. Trailing garbage after the end marker is ignored, as is a
/// trailing partial record.
pub fn commands(body: &[u8]) -> impl Iterator<Item = Command> + '_ {
    let mut done = false;
    body.chunks_exact(3).map_while(move |bytes| {
        if done {
            return None;
        }
        let cmd = Command::from_bytes([bytes[0], bytes[1], bytes[2]]);
        if cmd.is_end() {
            done = true;
        }
        Some(cmd)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DSB_OP_END, DSB_OP_JUMP_NEG_Y, DSB_OP_STITCH};

    #[test]
    fn header_round_trips_through_parse() {
        let stats = HeaderStats {
            stitches: 42,
            color_changes: 2,
            min_x: -13,
            max_x: 180,
            min_y: -1,
            max_y: 540,
            end_x: 9,
            end_y: -27,
        };
        assert_eq!(parse_header(&stats.to_header()).unwrap(), stats);
    }

    #[test]
    fn zero_stats_round_trip() {
        let stats = HeaderStats::default();
        assert_eq!(parse_header(&stats.to_header()).unwrap(), stats);
    }

    #[test]
    fn short_input_is_a_truncated_header() {
        let err = parse_header(&[0x20; 100]).unwrap_err();
        assert!(matches!(err, ReadError::TruncatedHeader { len: 100 }));
    }

    #[test]
    fn wrong_label_is_rejected() {
        let err = parse_header(&[b'X'; HEADER_LEN]).unwrap_err();
        assert!(matches!(err, ReadError::BadLabel));
    }

    #[test]
    fn label_is_checked_in_full() {
        // The "LA:" prefix alone is not enough; the whole label must match.
        let mut header = HeaderStats::default().to_header();
        header[10] ^= 0xFF;
        let err = parse_header(&header).unwrap_err();
        assert!(matches!(err, ReadError::BadLabel));
    }

    #[test]
    fn split_requires_an_end_marker() {
        let mut file = HeaderStats::default().to_header().to_vec();
        file.extend_from_slice(&[DSB_OP_STITCH, 2, 3]);
        let err = split(&file).unwrap_err();
        assert!(matches!(err, ReadError::MissingEndMarker));

        file.extend_from_slice(&Command::END.to_bytes());
        let (_, body) = split(&file).unwrap();
        assert_eq!(body.len(), 6);
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let mut header = HeaderStats::default().to_header();
        // Blank out the CO: line.
        let text_start = HEADER_LABEL.len();
        let pos = header[text_start..]
            .windows(3)
            .position(|w| w == b"CO:")
            .unwrap();
        header[text_start + pos..text_start + pos + 3].copy_from_slice(b"ZZ:");
        let err = parse_header(&header).unwrap_err();
        assert!(matches!(err, ReadError::MissingField { field: "CO:" }));
    }

    #[test]
    fn command_iteration_stops_at_end_marker() {
        let body = [
            DSB_OP_STITCH,
            2,
            3,
            DSB_OP_JUMP_NEG_Y,
            200,
            0,
            DSB_OP_END,
            0,
            0,
            0xAA,
            0xBB,
            0xCC,
        ];
        let cmds: Vec<_> = commands(&body).collect();
        assert_eq!(cmds.len(), 3);
        assert!(cmds[0].is_stitch());
        assert_eq!(cmds[1].signed_delta(), (0, -200));
        assert!(cmds[2].is_end());
    }
}
