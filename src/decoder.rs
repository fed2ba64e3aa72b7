use crate::encoder::check_compression;
use crate::{err_to_io_error, Channel, ChannelConfig, CompressInput, SampleGrid};
use flate2::write::GzDecoder;
use log::debug;
use std::io::{BufRead, Read, Seek, Write};

/// Recovers a message hidden by [`Encoder`](crate::encoder::Encoder).
pub struct Decoder {
    channel: Channel,
    compress_input: CompressInput,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            channel: Channel::default(),
            compress_input: CompressInput::None,
        }
    }
}

impl Decoder {
    pub fn new(config: ChannelConfig, compress_input: CompressInput) -> Result<Self, std::io::Error> {
        check_compression(&config, compress_input)?;
        let channel = Channel::new(config).map_err(err_to_io_error)?;

        Ok(Self {
            channel,
            compress_input,
        })
    }

    pub fn decode<R: BufRead + Read + Seek, W: Write>(
        &self,
        input_image: &mut R,
        key: &[u8],
        output: &mut W,
    ) -> Result<(), std::io::Error> {
        match image::load(input_image, image::ImageFormat::Png) {
            Ok(img) => {
                let grid = SampleGrid::from(img.to_rgb8());
                let payload = self.uncover_from(&grid, key)?;
                output.write_all(&payload)
            }
            Err(err) => Err(err_to_io_error(err)),
        }
    }

    fn uncover_from(&self, grid: &SampleGrid, key: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        let extracted = self
            .channel
            .extract(grid, key)
            .map_err(err_to_io_error)?;

        debug!("extracted {} payload bytes", extracted.len());

        if self.compress_input == CompressInput::Gzip {
            let mut gzip_decoder = GzDecoder::new(Vec::new());
            gzip_decoder.write_all(&extracted)?;
            return gzip_decoder.finish();
        }

        Ok(extracted)
    }
}
