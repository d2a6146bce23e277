use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use ircut_image::{Image, ImageSize};
use png::{BitDepth, ColorType, Decoder, Encoder};

use crate::error::IoError;

/// PNG compression setting for saved pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngCompression {
    /// Fastest encoding, largest files.
    #[default]
    Fast,
    /// The encoder's default trade-off.
    Default,
    /// Smallest files, slowest encoding.
    Best,
}

impl PngCompression {
    fn to_png(self) -> png::Compression {
        match self {
            Self::Fast => png::Compression::Fast,
            Self::Default => png::Compression::Default,
            Self::Best => png::Compression::Best,
        }
    }
}

impl std::str::FromStr for PngCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(Self::Fast),
            "default" => Ok(Self::Default),
            "best" => Ok(Self::Best),
            other => Err(format!(
                "unknown compression '{other}' (expected fast, default or best)"
            )),
        }
    }
}

/// Write a PNG image with three channels (rgb8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
/// * `image` - The image to write.
/// * `compression` - The encoder compression setting.
pub fn write_image_png_rgb8(
    file_path: impl AsRef<Path>,
    image: &Image<u8, 3>,
    compression: PngCompression,
) -> Result<(), IoError> {
    let file = File::create(file_path)?;
    let writer = BufWriter::new(file);

    let mut encoder = Encoder::new(writer, image.width() as u32, image.height() as u32);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_compression(compression.to_png());

    let mut writer = encoder
        .write_header()
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;
    writer
        .write_image_data(image.as_slice())
        .map_err(|e| IoError::PngEncodingError(e.to_string()))?;

    Ok(())
}

/// Read a PNG image with three channels (rgb8).
///
/// # Arguments
///
/// * `file_path` - The path to the PNG file.
pub fn read_image_png_rgb8(file_path: impl AsRef<Path>) -> Result<Image<u8, 3>, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let decoder = Decoder::new(BufReader::new(File::open(file_path)?));
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::PngDecodeError(e.to_string()))?;

    if info.color_type != ColorType::Rgb || info.bit_depth != BitDepth::Eight {
        return Err(IoError::PngDecodeError(format!(
            "expected rgb8 data, got {:?}/{:?}",
            info.color_type, info.bit_depth
        )));
    }

    buf.truncate(info.buffer_size());
    Ok(Image::new(
        ImageSize {
            width: info.width as usize,
            height: info.height as usize,
        },
        buf,
    )?)
}

/// Saves numbered pictures into a directory without overwriting.
///
/// Files are named `{dir}_{n}.png` after the directory they live in; the
/// counter starts past any picture already on disk. The compression
/// setting is fixed at construction.
pub struct PictureWriter {
    dir: PathBuf,
    prefix: String,
    next_index: u32,
    compression: PngCompression,
}

impl PictureWriter {
    /// Create a writer for the given directory, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>, compression: PngCompression) -> Result<Self, IoError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let prefix = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        // skip past pictures from previous sessions
        let mut next_index = 1;
        while dir.join(format!("{prefix}_{next_index}.png")).exists() {
            next_index += 1;
        }

        Ok(Self {
            dir,
            prefix,
            next_index,
            compression,
        })
    }

    /// The path the next picture will be saved to.
    pub fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_{}.png", self.prefix, self.next_index))
    }

    /// Save a picture and advance the counter.
    ///
    /// Returns the path the picture was written to.
    pub fn save(&mut self, image: &Image<u8, 3>) -> Result<PathBuf, IoError> {
        let path = self.next_path();
        write_image_png_rgb8(&path, image, self.compression)?;
        log::info!("saved picture -> {}", path.display());
        self.next_index += 1;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ircut_image::{Image, ImageSize};

    #[test]
    fn png_round_trip() -> Result<(), IoError> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("frame.png");

        let size = ImageSize {
            width: 4,
            height: 2,
        };
        let image = Image::<u8, 3>::new(size, (0..24).collect())?;

        write_image_png_rgb8(&path, &image, PngCompression::Fast)?;
        let read_back = read_image_png_rgb8(&path)?;

        assert_eq!(read_back.size(), size);
        assert_eq!(read_back.as_slice(), image.as_slice());

        Ok(())
    }

    #[test]
    fn picture_writer_numbers_files() -> Result<(), IoError> {
        let tmp = tempfile::tempdir()?;
        let dir = tmp.path().join("images");

        let image = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            128,
        )?;

        let mut writer = PictureWriter::new(&dir, PngCompression::Fast)?;
        let first = writer.save(&image)?;
        let second = writer.save(&image)?;
        assert_eq!(first.file_name().unwrap(), "images_1.png");
        assert_eq!(second.file_name().unwrap(), "images_2.png");

        // a fresh writer resumes past the existing pictures
        let writer = PictureWriter::new(&dir, PngCompression::Fast)?;
        assert_eq!(writer.next_path().file_name().unwrap(), "images_3.png");

        Ok(())
    }
}
