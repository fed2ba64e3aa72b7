use crate::{err_to_io_error, Channel, ChannelConfig, CompressInput, FramingMode, SampleGrid};
use flate2::read::GzEncoder;
use flate2::Compression;
use log::debug;
use std::io::{BufRead, Read, Seek, Write};

/// Hides a message in a PNG cover image.
pub struct Encoder {
    channel: Channel,
    compress_input: CompressInput,
}

impl Encoder {
    pub fn new(config: ChannelConfig, compress_input: CompressInput) -> Result<Self, std::io::Error> {
        check_compression(&config, compress_input)?;
        let channel = Channel::new(config).map_err(err_to_io_error)?;

        Ok(Self {
            channel,
            compress_input,
        })
    }

    pub fn encode<R1: BufRead + Read + Seek, R2: Read, W: Write>(
        &self,
        cover_image: R1,
        input_data: &mut R2,
        key: &[u8],
        output: &mut W,
    ) -> Result<(), std::io::Error> {
        match image::load(cover_image, image::ImageFormat::Png) {
            Ok(img) => {
                let mut raw = Vec::new();
                input_data.read_to_end(&mut raw)?;

                let payload = if let CompressInput::Gzip = self.compress_input {
                    self.compress(&raw)?
                } else {
                    raw
                };

                let grid = SampleGrid::from(img.to_rgb8());
                debug!(
                    "cover image: {}x{}, {} samples",
                    grid.width(),
                    grid.height(),
                    grid.len()
                );

                let stego = self
                    .channel
                    .embed(&payload, grid, key)
                    .map_err(err_to_io_error)?;
                let out_buffer = stego.into_rgb_image().map_err(err_to_io_error)?;

                match image::DynamicImage::ImageRgb8(out_buffer)
                    .write_to(output, image::ImageFormat::Png)
                {
                    Ok(_) => Ok(()),
                    Err(err) => Err(err_to_io_error(err)),
                }
            }
            Err(err) => Err(err_to_io_error(err)),
        }
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let mut compressed_data: Vec<u8> = Vec::new();
        let mut encoder = GzEncoder::new(data, Compression::default());
        encoder.read_to_end(&mut compressed_data)?;
        debug!(
            "compression ratio: {:.4}%",
            ((compressed_data.len() as f64) / (data.len().max(1) as f64)) * 100.0
        );

        Ok(compressed_data)
    }
}

// A gzip stream cannot be told apart from padding or be searched for a
// sentinel, so only the length prefix can frame it.
pub(crate) fn check_compression(
    config: &ChannelConfig,
    compress_input: CompressInput,
) -> Result<(), std::io::Error> {
    if compress_input == CompressInput::Gzip && config.framing != FramingMode::LengthPrefixed {
        return Err(err_to_io_error(format!(
            "gzip compression needs length-prefixed framing, got {:?}",
            config.framing
        )));
    }
    Ok(())
}
