use anyhow::{anyhow, bail, Context};
use emotive_core::authoring::{reconstruct, PackWriter};
use emotive_core::{Frame, FrameStore};
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::convert::{self, ConvertOptions};
use crate::{InspectArgs, PackArgs, UnpackArgs};

fn read_pack(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn parse_pack<'a>(path: &Path, bytes: &'a [u8]) -> anyhow::Result<FrameStore<'a>> {
    FrameStore::from_pack(bytes).map_err(|e| anyhow!("{} is not a valid pack: {e:?}", path.display()))
}

pub fn pack(args: &PackArgs) -> anyhow::Result<()> {
    if args.width == 0 || args.width % 8 != 0 || args.height == 0 {
        bail!("frame size {}x{} is not usable, width must be a non-zero multiple of 8", args.width, args.height);
    }

    info!("decoding {}..", args.input.display());
    let file = File::open(&args.input).with_context(|| format!("failed to open {}", args.input.display()))?;
    let decoder = GifDecoder::new(BufReader::new(file)).context("input is not a GIF")?;
    let frames = decoder.into_frames().collect_frames().context("failed to decode GIF frames")?;
    if frames.is_empty() {
        bail!("{} has no frames", args.input.display());
    }

    let options = ConvertOptions {
        width: args.width,
        height: args.height,
        threshold: args.threshold,
        invert: args.invert,
        cleanup: !args.raw,
    };

    let mut writer = PackWriter::new(args.width, args.height).map_err(|e| anyhow!("{e:?}"))?;
    for (idx, frame) in frames.iter().enumerate() {
        let bitmap = convert::frame_from_image(frame.buffer(), &options).map_err(|e| anyhow!("frame {idx}: {e:?}"))?;
        let delay = (!args.fixed_delay).then(|| convert::delay_ms(frame.delay()));

        let before = writer.total_deltas();
        writer.push_frame(&bitmap, delay).map_err(|e| anyhow!("frame {idx}: {e}"))?;
        debug!(idx, deltas = writer.total_deltas() - before, ?delay, "converted frame");
    }

    let total_deltas = writer.total_deltas();
    let bytes = writer.finish().map_err(|e| anyhow!("{e}"))?;
    fs::write(&args.output, &bytes).with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        frames = frames.len(),
        deltas = total_deltas,
        bytes = bytes.len(),
        "wrote {}",
        args.output.display()
    );
    Ok(())
}

pub fn unpack(args: &UnpackArgs) -> anyhow::Result<()> {
    let bytes = read_pack(&args.input)?;
    let store = parse_pack(&args.input, &bytes)?;
    let (width, height) = store.dimensions();

    let frames = reconstruct(&store).map_err(|e| anyhow!("{e:?}"))?;
    info!(frames = frames.len(), "reconstructed {}x{} frames", width, height);

    let out = File::create(&args.output).with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut encoder = GifEncoder::new(BufWriter::new(out));
    encoder.set_repeat(Repeat::Infinite)?;

    let gif_frames = frames.iter().enumerate().map(|(idx, frame)| {
        let image = convert::image_from_frame(frame, width, height, args.invert);
        let delay = Delay::from_numer_denom_ms(store.delay_ms(idx, args.delay) as u32, 1);
        image::Frame::from_parts(image, 0, 0, delay)
    });
    encoder
        .encode_frames(gif_frames)
        .with_context(|| format!("failed to encode {}", args.output.display()))?;

    info!("wrote {}", args.output.display());
    Ok(())
}

pub fn inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let bytes = read_pack(&args.input)?;
    let store = parse_pack(&args.input, &bytes)?;
    let (width, height) = store.dimensions();

    println!("{}", args.input.display());
    println!("  size        {}x{} ({} bytes per frame)", width, height, store.byte_len());
    println!("  frames      {}", store.frame_count());
    println!(
        "  delays      {}",
        if store.has_delay_table() { "per frame" } else { "firmware default" }
    );
    println!("  deltas      {}", store.total_deltas());
    println!(
        "  stored      {} of {} bytes ({:.1}%)",
        store.stored_bytes(),
        store.full_bytes(),
        100.0 * store.stored_bytes() as f64 / store.full_bytes().max(1) as f64
    );

    if args.frames {
        for idx in 0..store.frame_count() {
            let changed = match store.frame(idx).map_err(|e| anyhow!("frame {idx}: {e:?}"))? {
                Frame::Base(_) => "base".to_string(),
                Frame::Delta(deltas) => format!("{} deltas", deltas.len()),
            };
            let delay = if store.has_delay_table() {
                format!("{} ms", store.delay_ms(idx, 0))
            } else {
                "-".to_string()
            };
            println!("  #{idx:<4} {changed:<12} {delay}");
        }
    }

    Ok(())
}
