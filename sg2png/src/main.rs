use crate::tool::Sg2Png;
use std::path::PathBuf;
use structopt::StructOpt;

mod tool;

/// Extracts every image of an SG2/SG3 art container into PNG files,
/// one directory per container.
#[derive(StructOpt, Debug)]
#[structopt(name = "sg2png")]
pub struct Sg2PngParameters {
    /// Input file (.sg2, .sg3)
    #[structopt(short, long, parse(from_os_str))]
    input: PathBuf,

    /// Directory for output files
    #[structopt(short, long, parse(from_os_str), default_value = ".")]
    output: PathBuf,

    /// Also extract the system bitmap's images
    #[structopt(short, long)]
    system: bool,
}

fn main() {
    env_logger::init();

    let params = Sg2PngParameters::from_args();
    match Sg2Png::extract(params) {
        Ok(stats) => println!(
            "extracted {} images ({} failed)",
            stats.written, stats.failed
        ),
        Err(err) => {
            eprintln!("extraction failed: {:?}", err);
            std::process::exit(1);
        }
    }
}
