use ircut_image::{Image, ImageSize};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::{Device, FourCC};

/// Error types for the v4l module.
#[derive(Debug, thiserror::Error)]
pub enum V4lError {
    /// Failed to create image
    #[error(transparent)]
    ImageError(#[from] ircut_image::ImageError),

    /// Failed to talk to the camera device
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// The camera does not support the requested pixel format
    #[error("Camera does not support the {0} pixel format")]
    UnsupportedFormat(String),

    /// The camera delivered a buffer of unexpected length
    #[error("Camera buffer of {0} bytes does not match a {1}x{2} YUYV frame")]
    InvalidBufferSize(usize, usize, usize),
}

/// Configuration for V4L video capture.
pub struct V4lCameraConfig {
    /// The camera device path
    pub device_path: String,
    /// The desired image size
    pub size: ImageSize,
    /// The desired frames per second
    pub fps: u32,
}

impl Default for V4lCameraConfig {
    fn default() -> Self {
        Self {
            device_path: "/dev/video0".to_string(),
            size: ImageSize {
                width: 640,
                height: 480,
            },
            fps: 30,
        }
    }
}

/// V4L video capture delivering RGB frames.
pub struct V4lVideoCapture {
    stream: MmapStream<'static>,
    size: ImageSize,
    fourcc: FourCC,
}

impl V4lVideoCapture {
    /// Open a camera and negotiate a YUYV stream.
    pub fn new(config: V4lCameraConfig) -> Result<Self, V4lError> {
        let device = Device::with_path(&config.device_path)?;

        let mut format = device.format()?;
        format.width = config.size.width as u32;
        format.height = config.size.height as u32;
        format.fourcc = FourCC::new(b"YUYV");
        device.set_format(&format)?;

        // verify the format was actually set (the driver may refuse it)
        let actual = device.format()?;
        if actual.fourcc != format.fourcc {
            return Err(V4lError::UnsupportedFormat("YUYV".to_string()));
        }

        let size = ImageSize {
            width: actual.width as usize,
            height: actual.height as usize,
        };
        if size != config.size {
            log::warn!(
                "camera negotiated {}x{} instead of {}x{}",
                size.width,
                size.height,
                config.size.width,
                config.size.height
            );
        }

        device.set_params(&Parameters::with_fps(config.fps))?;

        // the stream holds its own reference to the device handle, so the
        // device binding itself does not need to outlive this call
        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, 4)?;

        Ok(Self {
            stream,
            size,
            fourcc: actual.fourcc,
        })
    }

    /// The negotiated frame size.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The negotiated pixel format.
    #[inline]
    pub fn fourcc(&self) -> FourCC {
        self.fourcc
    }

    /// Block until the next frame and convert it to RGB.
    pub fn grab_rgb(&mut self) -> Result<Image<u8, 3>, V4lError> {
        let (buffer, _meta) = self.stream.next()?;

        let mut rgb = Image::from_size_val(self.size, 0u8)?;
        yuyv_to_rgb(buffer, &mut rgb)?;

        Ok(rgb)
    }
}

/// Convert a packed YUYV 4:2:2 buffer into an RGB image.
///
/// Two horizontally adjacent pixels share one chroma pair; the conversion
/// uses 8-bit fixed-point BT.601 coefficients.
pub fn yuyv_to_rgb(yuyv: &[u8], rgb: &mut Image<u8, 3>) -> Result<(), V4lError> {
    let (width, height) = (rgb.width(), rgb.height());
    if yuyv.len() < width * height * 2 {
        return Err(V4lError::InvalidBufferSize(yuyv.len(), width, height));
    }

    let px = |y: i32, off: i32| (((y << 8) + off) >> 8).clamp(0, 255) as u8;

    rgb.as_slice_mut()
        .chunks_exact_mut(6) // 6 bytes = 2 RGB pixels
        .zip(yuyv.chunks_exact(4))
        .for_each(|(rgb_chunk, yuyv_chunk)| {
            let y0 = yuyv_chunk[0] as i32;
            let u = yuyv_chunk[1] as i32 - 128;
            let y1 = yuyv_chunk[2] as i32;
            let v = yuyv_chunk[3] as i32 - 128;

            // chroma offsets scaled by 256, shared by both pixels
            let r_off = 359 * v;
            let g_off = -88 * u - 183 * v;
            let b_off = 454 * u;

            rgb_chunk[0] = px(y0, r_off);
            rgb_chunk[1] = px(y0, g_off);
            rgb_chunk[2] = px(y0, b_off);
            rgb_chunk[3] = px(y1, r_off);
            rgb_chunk[4] = px(y1, g_off);
            rgb_chunk[5] = px(y1, b_off);
        });

    Ok(())
}
