mod atlas;
mod blob;
mod emit;
mod error;
mod glyph;
mod pack;
mod tables;

use error::CompileError;
use log::{info, warn};
use std::io::{Read, Write};
use std::path::PathBuf;

fn main() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// First non-option argument is the atlas path; none (or "-") means stdin.
fn input_path() -> Option<PathBuf> {
    let mut input = None;
    for arg in std::env::args().skip(1) {
        if arg == "-" {
            continue;
        }
        if arg.starts_with('-') {
            warn!("ignoring unknown option '{arg}'");
        } else if input.is_none() {
            input = Some(PathBuf::from(arg));
        } else {
            warn!("ignoring extra argument '{arg}'");
        }
    }
    input
}

fn run() -> Result<(), CompileError> {
    let bytes = match input_path() {
        Some(path) => {
            info!("reading atlas from '{}'", path.display());
            std::fs::read(path)?
        }
        None => {
            info!("reading atlas from stdin");
            let mut buf = Vec::new();
            std::io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };

    let img = atlas::decode_atlas(&bytes)?;
    let glyphs = atlas::extract_glyphs(&img)?;
    let layout = tables::plan_layout(&glyphs)?;
    let packed = pack::pack_index(&layout);
    let blob = blob::assemble(&layout, packed);
    let params = blob::FontParams::from_layout(&layout);

    // Nothing reaches stdout until the blob is complete: a fatal error never
    // leaves partial output behind.
    let mut out = std::io::BufWriter::new(std::io::stdout().lock());
    emit::emit(&mut out, &layout, &blob, &params)?;
    out.flush()?;

    info!(
        "emitted {} bytes of font data for codes 0x{:02x}..=0x{:02x}",
        blob.total_len(),
        params.first_glyph,
        params.last_glyph
    );
    Ok(())
}
