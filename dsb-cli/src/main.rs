use argh::FromArgs;
use dsb::{
    convert_to_vec,
    image::{QuantizedImage, Rgb},
    read, ConvertOptions,
};
use image::ImageFormat;
use std::{collections::HashMap, fs::File, io::BufReader, str::FromStr};

/// DSB embroidery converter and inspector.
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Convert(Convert),
    Info(Info),
}

#[derive(Debug)]
enum Format {
    Png,
    Jpg,
    Bmp,
}

impl FromStr for Format {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        #[rustfmt::skip]
        let Some(format) = s.eq_ignore_ascii_case("png").then_some(Format::Png)
               .or_else(|| s.eq_ignore_ascii_case("jpg").then_some(Format::Jpg))
               .or_else(|| s.eq_ignore_ascii_case("bmp").then_some(Format::Bmp))
        else { return Err("invalid string"); };

        Ok(format)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli { command } = argh::from_env();

    match command {
        Command::Convert(options) => convert(options),
        Command::Info(options) => info(options),
    }
}

/// Converts a small-palette image into a DSB stitch file.
#[derive(FromArgs)]
#[argh(subcommand, name = "convert")]
struct Convert {
    /// input format, optional (png, jpg, bmp)
    #[argh(option)]
    format: Option<Format>,

    /// palette index to leave unstitched; may be given multiple times
    #[argh(option)]
    exclude: Vec<u8>,

    /// comma-separated palette indices giving the stitch order
    #[argh(option)]
    order: Option<String>,

    /// the input image. If no format is given, it is guessed.
    #[argh(positional)]
    input: String,
    /// the output .dsb file
    #[argh(positional)]
    output: String,
}

/// Prints the header statistics and command counts of a DSB file.
#[derive(FromArgs)]
#[argh(subcommand, name = "info")]
struct Info {
    /// the .dsb file to inspect
    #[argh(positional)]
    input: String,
}

/// Builds a quantized image from exact pixel colors, palette ordered by
/// first appearance. The input must already be palette-reduced; anything
/// past 256 distinct colors is refused.
fn extract_palette(rgb: &image::RgbImage) -> Result<QuantizedImage, Box<dyn std::error::Error>> {
    let mut palette: Vec<Rgb> = Vec::new();
    let mut lookup: HashMap<Rgb, u8> = HashMap::new();
    let mut indices = Vec::with_capacity(rgb.len() / 3);

    for pixel in rgb.pixels() {
        let color = Rgb::from(pixel.0);
        let index = match lookup.get(&color) {
            Some(&index) => index,
            None => {
                if palette.len() == 256 {
                    return Err(
                        "image has more than 256 colors; reduce the palette first".into()
                    );
                }
                let index = palette.len() as u8;
                palette.push(color);
                lookup.insert(color, index);
                index
            }
        };
        indices.push(Some(index));
    }

    Ok(QuantizedImage::new(
        rgb.width(),
        rgb.height(),
        indices,
        palette,
    )?)
}

fn convert(options: Convert) -> Result<(), Box<dyn std::error::Error>> {
    let Convert {
        format,
        exclude,
        order,
        input,
        output,
    } = options;

    let image = match format {
        Some(Format::Png) => {
            image::io::Reader::with_format(BufReader::new(File::open(&input)?), ImageFormat::Png)
                .decode()?
        }
        Some(Format::Jpg) => {
            image::io::Reader::with_format(BufReader::new(File::open(&input)?), ImageFormat::Jpeg)
                .decode()?
        }
        Some(Format::Bmp) => {
            image::io::Reader::with_format(BufReader::new(File::open(&input)?), ImageFormat::Bmp)
                .decode()?
        }
        None => image::io::Reader::open(&input)?
            .with_guessed_format()?
            .decode()?,
    };

    let rgb = image.into_rgb8();
    let quantized = extract_palette(&rgb)?;

    println!(
        "Converting {}x{} image with {} colors",
        quantized.width(),
        quantized.height(),
        quantized.palette().len()
    );

    let color_order = order
        .map(|s| {
            s.split(',')
                .map(|t| t.trim().parse::<u8>())
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let data = convert_to_vec(
        &quantized,
        &ConvertOptions {
            color_order,
            exclude,
        },
    )?;

    std::fs::write(&output, &data)?;
    println!("Written {} bytes to `{output}`", data.len());

    Ok(())
}

fn info(options: Info) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(&options.input)?;
    let (stats, body) = read::split(&data)?;

    let mut stitches = 0u64;
    let mut jumps = 0u64;
    let mut color_changes = 0u64;
    for cmd in read::commands(body) {
        if cmd.is_stitch() {
            stitches += 1;
        } else if cmd.is_jump() {
            jumps += 1;
        } else if cmd.is_color_change() {
            color_changes += 1;
        }
    }

    println!("`{}`:", options.input);
    println!("  stitches (header):      {}", stats.stitches);
    println!("  color changes (header): {}", stats.color_changes);
    println!(
        "  extents:                +X {} / -X {} / +Y {} / -Y {}",
        stats.max_x.max(0),
        stats.min_x.min(0).abs(),
        stats.max_y.max(0),
        stats.min_y.min(0).abs()
    );
    println!("  final position:         ({}, {})", stats.end_x, stats.end_y);
    println!("  stitches (stream):      {stitches}");
    println!("  jumps (stream):         {jumps}");
    println!("  color changes (stream): {color_changes}");

    Ok(())
}
