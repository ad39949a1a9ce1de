//! emotive-pack: build, inspect and preview expression packs
//!
//! ```text
//! emotive-pack pack happy.gif -o assets/happy.epk
//! emotive-pack unpack assets/happy.epk -o preview.gif
//! emotive-pack inspect assets/happy.epk
//! ```

#[macro_use]
extern crate tracing;

mod commands;
mod convert;

use argh::FromArgs;
use std::path::PathBuf;

#[derive(FromArgs)]
/// convert animated GIFs to delta packs for the companion firmware
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Pack(PackArgs),
    Unpack(UnpackArgs),
    Inspect(InspectArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "pack")]
/// convert an animated GIF into a delta pack
pub struct PackArgs {
    #[argh(positional)]
    /// input GIF
    pub input: PathBuf,

    #[argh(option, short = 'o')]
    /// output pack file
    pub output: PathBuf,

    #[argh(option, default = "140")]
    /// pixels brighter than this are lit
    pub threshold: u8,

    #[argh(switch)]
    /// light dark pixels instead of bright ones
    pub invert: bool,

    #[argh(option, default = "128")]
    /// frame width in pixels, a multiple of 8
    pub width: u16,

    #[argh(option, default = "64")]
    /// frame height in pixels
    pub height: u16,

    #[argh(switch)]
    /// leave out the delay table so the firmware paces every frame itself
    pub fixed_delay: bool,

    #[argh(switch)]
    /// skip blur and dot removal
    pub raw: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "unpack")]
/// render a delta pack back into an animated GIF
pub struct UnpackArgs {
    #[argh(positional)]
    /// input pack file
    pub input: PathBuf,

    #[argh(option, short = 'o')]
    /// output GIF
    pub output: PathBuf,

    #[argh(option, default = "100")]
    /// per-frame delay for packs without a delay table
    pub delay: u16,

    #[argh(switch)]
    /// draw lit pixels black on white
    pub invert: bool,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "inspect")]
/// print what a delta pack contains
pub struct InspectArgs {
    #[argh(positional)]
    /// input pack file
    pub input: PathBuf,

    #[argh(switch)]
    /// list the delta count of every frame
    pub frames: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    match args.command {
        Command::Pack(args) => commands::pack(&args),
        Command::Unpack(args) => commands::unpack(&args),
        Command::Inspect(args) => commands::inspect(&args),
    }
}
