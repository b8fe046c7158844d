//! The full pipeline: segment, plan, encode, write.

use crate::{
    consts::HEADER_LEN,
    encode::{encode_move, EncodeError},
    image::{segment, QuantizedImage},
    plan::{plan_region, Move, Point},
    write::{ByteSink, DsbWriter, HeaderStats, WriteError},
};
use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(display(
        "color order references palette index {index}, \
         but the palette has {palette_len} entries"
    ))]
    OrderOutOfRange { index: u8, palette_len: usize },
    #[snafu(display("failed to encode a planned move"))]
    Encode { source: EncodeError },
    #[snafu(display("failed to write the command stream"))]
    Write { source: WriteError },
}

/// Caller control over stitch order and color omission.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Palette indices in the order their regions are stitched. `None`
    /// means palette order. Every entry plans that color's region.
    pub color_order: Option<Vec<u8>>,
    /// Palette indices to skip entirely: no moves, no color change.
    pub exclude: Vec<u8>,
}

/// Streams the command body (no header) for an image into a sink.
///
/// Regions are planned in palette order unless reordered; excluded and
/// empty regions are skipped without emitting a color change. A color
/// change precedes every planned region after the first. The returned
/// stats are what [`HeaderStats::to_header`] needs.
pub fn convert_into_sink<S: ByteSink>(
    image: &QuantizedImage,
    options: &ConvertOptions,
    sink: S,
) -> Result<(HeaderStats, S), ConvertError> {
    let palette_len = image.palette().len();
    let order: Vec<u8> = match &options.color_order {
        Some(order) => order.clone(),
        None => (0..palette_len as u16).map(|i| i as u8).collect(),
    };
    for &index in &order {
        ensure!(
            usize::from(index) < palette_len,
            OrderOutOfRangeSnafu { index, palette_len }
        );
    }

    let regions = segment(image);
    let mut writer = DsbWriter::new(sink);
    let mut pen = Point::default();
    let mut planned_any = false;

    for index in order {
        if options.exclude.contains(&index) {
            continue;
        }
        let region = &regions[usize::from(index)];
        if region.is_empty() {
            continue;
        }

        if planned_any {
            for cmd in encode_move(Move::ColorChange).context(EncodeSnafu)? {
                writer.push(&cmd).context(WriteSnafu)?;
            }
        }
        planned_any = true;

        let (moves, end) = plan_region(region, pen);
        for mv in moves {
            for cmd in encode_move(mv).context(EncodeSnafu)? {
                writer.push(&cmd).context(WriteSnafu)?;
            }
        }
        pen = end;
    }

    writer.finalize().context(WriteSnafu)
}

/// Converts an image to a complete in-memory DSB file: the body is
/// streamed first, then the real header is put in front once the
/// statistics are final.
pub fn convert_to_vec(
    image: &QuantizedImage,
    options: &ConvertOptions,
) -> Result<Vec<u8>, ConvertError> {
    let (stats, body) = convert_into_sink(image, options, Vec::new())?;

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(&stats.to_header());
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgb;

    fn diagonal_image() -> QuantizedImage {
        QuantizedImage::new(
            2,
            2,
            vec![Some(0), Some(1), Some(1), Some(0)],
            vec![Rgb::new(0, 0, 0), Rgb::new(255, 255, 255)],
        )
        .unwrap()
    }

    #[test]
    fn bad_color_order_is_rejected_before_any_output() {
        let image = diagonal_image();
        let options = ConvertOptions {
            color_order: Some(vec![0, 7]),
            ..Default::default()
        };
        let err = convert_into_sink(&image, &options, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ConvertError::OrderOutOfRange { index: 7, palette_len: 2 }
        ));
    }

    #[test]
    fn excluding_every_color_yields_only_the_end_marker() {
        let image = diagonal_image();
        let options = ConvertOptions {
            exclude: vec![0, 1],
            ..Default::default()
        };
        let (stats, body) = convert_into_sink(&image, &options, Vec::new()).unwrap();
        assert_eq!(stats.stitches, 0);
        assert_eq!(stats.color_changes, 0);
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn single_color_design_has_no_color_change() {
        let image = QuantizedImage::new(1, 1, vec![Some(0)], vec![Rgb::new(1, 2, 3)]).unwrap();
        let (stats, _) = convert_into_sink(&image, &ConvertOptions::default(), Vec::new()).unwrap();
        assert_eq!(stats.color_changes, 0);
        assert!(stats.stitches > 0);
    }
}
