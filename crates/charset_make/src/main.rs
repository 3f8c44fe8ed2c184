use std::path::PathBuf;

use charset_engine::{CharMap, CharsetFormat, FontRasterizer};
use clap::{ArgGroup, Parser};
use flexi_logger::Logger;

#[derive(Parser)]
#[command(
    name = "charset_make",
    about = "Converts an outline font into a retro game charset resource and/or a preview atlas image.",
    group(ArgGroup::new("output").required(true).multiple(true).args(["obmp", "ochar"]))
)]
struct Cli {
    #[arg(help = "Font file to convert (TTF/OTF).", long, required = true)]
    font: PathBuf,

    #[arg(help = "Face index inside the font file.", long, default_value_t = 0)]
    face_index: u32,

    #[arg(help = "Write a preview atlas image (BMP or PNG, by extension).", long)]
    obmp: Option<PathBuf>,

    #[arg(help = "Write the binary charset resource.", long)]
    ochar: Option<PathBuf>,

    #[arg(help = "Character width in points (0 = same as height). Values >= 128 are taken as 1/64 points.", long, default_value_t = 0)]
    cw: i32,

    #[arg(help = "Character height in points. Values >= 128 are taken as 1/64 points.", long, default_value_t = 24)]
    ch: i32,

    #[arg(help = "Horizontal resolution in dpi.", long, default_value_t = 30)]
    hdpi: u32,

    #[arg(help = "Vertical resolution in dpi.", long, default_value_t = 30)]
    vdpi: u32,

    #[arg(help = "Extra line spacing in pixels, may be negative.", long, default_value_t = 0, allow_hyphen_values = true)]
    vspace: i32,

    #[arg(help = "Width of the preview atlas in pixels.", long, default_value_t = 800)]
    atlas_width: usize,

    #[arg(help = "Spacing around each atlas cell in pixels.", long, default_value_t = 8)]
    atlas_spacing: usize,
}

fn run(args: &Cli) -> charset_engine::Result<()> {
    let mut rasterizer = FontRasterizer::load(&args.font, args.face_index)?;

    // Sizes below two dots don't make much sense, treat them as whole points.
    let char_width = if args.cw != 0 && args.cw < 128 { args.cw * 64 } else { args.cw };
    let char_height = if args.ch != 0 && args.ch < 128 { args.ch * 64 } else { args.ch };
    rasterizer.set_char_size(char_width, char_height, args.hdpi, args.vdpi);

    // Identity mapping over the 8-bit range; slot 0 stays empty.
    let codes: Vec<u32> = (0..255).collect();
    let map = CharMap::from_rasterizer(&mut rasterizer, &codes, args.vspace)?;
    log::info!(
        "Built charmap from '{}': {} glyphs, line height {}, cell width {}",
        rasterizer.path().display(),
        map.populated().count(),
        map.line_height,
        map.cell_width
    );

    if let Some(path) = &args.obmp {
        let atlas = map.to_atlas(args.atlas_width, args.atlas_spacing)?;
        atlas.save(path)?;
        log::info!("Wrote {}x{} atlas to '{}'", atlas.width, atlas.height, path.display());
    }

    if let Some(path) = &args.ochar {
        CharsetFormat::save(&map, path)?;
        log::info!("Wrote charset resource to '{}'", path.display());
    }

    Ok(())
}

fn main() {
    let args = Cli::parse();

    let _logger = Logger::try_with_env_or_str("info")
        .expect("invalid log spec")
        .start();

    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
