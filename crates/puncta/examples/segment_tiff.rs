use puncta::{read_volume, OutputMode, Segmenter, TiffDiagnosticsSink};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <volume.tiff> <out_dir> [rescale_ratio]", args[0]);
        std::process::exit(2);
    }

    let volume = read_volume(Path::new(&args[1]))?;
    let out_dir = Path::new(&args[2]);
    let ratio: Option<f32> = args.get(3).map(|s| s.parse()).transpose()?;
    let base_name = Path::new(&args[1])
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("volume");

    let segmenter = Segmenter::default();
    let mut sink = TiffDiagnosticsSink::new();
    segmenter.segment(
        &volume,
        ratio,
        OutputMode::Customize {
            output_dir: out_dir,
            base_name,
            sink: &mut sink,
        },
    )?;
    for path in sink.written() {
        println!("wrote {}", path.display());
    }
    Ok(())
}
